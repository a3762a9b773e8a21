//! Name utilities
//!
//! Splitting of prefixed names and the naming conventions the OCX schema
//! follows: CamelCase for elements and dromedaryCase for attributes.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\-\.0-9]*$")
        .expect("NCName pattern")
});

// A character at the start of the name or right after an underscore.
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|_)(.)").expect("camel boundary pattern"));

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Check if a string is a valid prefixed name (`prefix:local` or `local`)
pub fn is_valid_qname(name: &str) -> bool {
    match split_qname(name) {
        (Some(prefix), local) => is_valid_ncname(prefix) && is_valid_ncname(local),
        (None, local) => is_valid_ncname(local),
    }
}

/// Validate a prefixed name and return an error if invalid
pub fn validate_qname(name: &str) -> Result<()> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid QName: '{}'", name)))
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Camelize an underscored name.
///
/// Every character that starts the name or follows an underscore is
/// upper-cased and the underscores are dropped. With `upper_first` false the
/// first character is lower-cased instead, giving dromedaryCase.
pub fn camelize(name: &str, upper_first: bool) -> String {
    let camel = CAMEL_BOUNDARY.replace_all(name, |caps: &Captures| caps[1].to_uppercase());
    if upper_first {
        return camel.into_owned();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = camel.chars().skip(1).collect();
            format!("{}{}", first.to_lowercase(), rest)
        }
        None => String::new(),
    }
}

/// True if the name is CamelCase (upper camel case)
pub fn is_camel_case(name: &str) -> bool {
    camelize(name, true) == name
}

/// True if the name is dromedaryCase (lower camel case)
pub fn is_dromedary_case(name: &str) -> bool {
    camelize(name, false) == name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("Vessel_T"));
        assert!(is_valid_ncname("my-element"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("ocx:Vessel"));
        assert!(!is_valid_ncname("3D"));
    }

    #[test]
    fn test_is_valid_qname() {
        assert!(is_valid_qname("Vessel"));
        assert!(is_valid_qname("ocx:Vessel"));
        assert!(is_valid_qname("xs:string"));

        assert!(!is_valid_qname(""));
        assert!(!is_valid_qname(":Vessel"));
        assert!(!is_valid_qname("ocx:"));
        assert!(validate_qname("ocx:").is_err());
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("Vessel"), (None, "Vessel"));
        assert_eq!(split_qname("ocx:Vessel"), (Some("ocx"), "Vessel"));
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("ship_design", true), "ShipDesign");
        assert_eq!(camelize("ship_design", false), "shipDesign");
        assert_eq!(camelize("GUIDRef", true), "GUIDRef");
        assert_eq!(camelize("GUIDRef", false), "gUIDRef");
        assert_eq!(camelize("", false), "");
    }

    #[test]
    fn test_case_conventions() {
        assert!(is_camel_case("Vessel"));
        assert!(is_camel_case("CoordinateSystem"));
        assert!(!is_camel_case("vessel"));
        assert!(!is_camel_case("time_stamp"));

        assert!(is_dromedary_case("functionType"));
        assert!(!is_dromedary_case("FunctionType"));
        assert!(!is_dromedary_case("application_version"));
    }
}
