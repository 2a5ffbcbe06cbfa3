//
// predefined.rs
//
// Namespace bindings every query processor declares before the prolog
//

use crate::dialect::VendorProfile;

/// A predeclared `(prefix, uri)` pair.
pub type PredefinedNamespace = (&'static str, &'static str);

pub const ARRAY_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions/array";
pub const ERR_NAMESPACE: &str = "http://www.w3.org/2005/xqt-error";
pub const FN_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions";
pub const LOCAL_NAMESPACE: &str = "http://www.w3.org/2005/xquery-local-functions";
pub const MAP_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions/map";
pub const MATH_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions/math";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The function namespace used when no default function namespace is declared.
pub const DEFAULT_FUNCTION_NAMESPACE: &str = FN_NAMESPACE;

pub const W3C_NAMESPACES: &[PredefinedNamespace] = &[
    ("array", ARRAY_NAMESPACE),
    ("fn", FN_NAMESPACE),
    ("local", LOCAL_NAMESPACE),
    ("map", MAP_NAMESPACE),
    ("math", MATH_NAMESPACE),
    ("xml", XML_NAMESPACE),
    ("xs", XS_NAMESPACE),
    ("xsi", XSI_NAMESPACE),
];

pub const MARKLOGIC_JSON_NAMESPACE: &str = "http://marklogic.com/xdmp/json";
pub const MARKLOGIC_MAP_NAMESPACE: &str = "http://marklogic.com/xdmp/map";
pub const MARKLOGIC_MATH_NAMESPACE: &str = "http://marklogic.com/xdmp/math";
pub const XDMP_NAMESPACE: &str = "http://marklogic.com/xdmp";
pub const CTS_NAMESPACE: &str = "http://marklogic.com/cts";

/// Predeclared by every MarkLogic release. MarkLogic binds `map` and `math`
/// to its own modules and has no `array` prefix.
const MARKLOGIC_BASE: &[PredefinedNamespace] = &[
    ("cts", CTS_NAMESPACE),
    ("dav", "DAV:"),
    ("dbg", "http://marklogic.com/xdmp/dbg"),
    ("dir", "http://marklogic.com/xdmp/directory"),
    ("err", ERR_NAMESPACE),
    ("error", "http://marklogic.com/xdmp/error"),
    ("fn", FN_NAMESPACE),
    ("local", LOCAL_NAMESPACE),
    ("lock", "http://marklogic.com/xdmp/lock"),
    ("map", MARKLOGIC_MAP_NAMESPACE),
    ("math", MARKLOGIC_MATH_NAMESPACE),
    ("prof", "http://marklogic.com/xdmp/profile"),
    ("prop", "http://marklogic.com/xdmp/property"),
    ("sec", "http://marklogic.com/security"),
    ("spell", "http://marklogic.com/xdmp/spell"),
    ("xdmp", XDMP_NAMESPACE),
    ("xml", XML_NAMESPACE),
    ("xqe", "http://marklogic.com/xqe"),
    ("xqterr", ERR_NAMESPACE),
    ("xs", XS_NAMESPACE),
    ("xsi", XSI_NAMESPACE),
];

/// Prefixes added by later MarkLogic releases, grouped by the release that
/// introduced them.
const MARKLOGIC_ADDITIONS: &[PredefinedNamespace] = &[
    // MarkLogic 6
    ("geo", "http://marklogic.com/geospatial"),
    // MarkLogic 7
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("sc", "http://marklogic.com/xdmp/schema-components"),
    ("sem", "http://marklogic.com/xdmp/semantics"),
    // MarkLogic 8
    ("json", MARKLOGIC_JSON_NAMESPACE),
    ("sql", "http://marklogic.com/xdmp/sql"),
    ("temporal", "http://marklogic.com/xdmp/temporal"),
    // MarkLogic 9
    ("tde", "http://marklogic.com/xdmp/tde"),
];

const BASEX_ADDITIONS: &[PredefinedNamespace] = &[
    ("admin", "http://basex.org/modules/admin"),
    ("archive", "http://basex.org/modules/archive"),
    ("bxerr", "http://basex.org/errors"),
    ("client", "http://basex.org/modules/client"),
    ("convert", "http://basex.org/modules/convert"),
    ("csv", "http://basex.org/modules/csv"),
    ("db", "http://basex.org/modules/db"),
    ("fetch", "http://basex.org/modules/fetch"),
    ("file", "http://expath.org/ns/file"),
    ("ft", "http://basex.org/modules/ft"),
    ("hash", "http://basex.org/modules/hash"),
    ("hof", "http://basex.org/modules/hof"),
    ("html", "http://basex.org/modules/html"),
    ("index", "http://basex.org/modules/index"),
    ("inspect", "http://basex.org/modules/inspect"),
    ("json", "http://basex.org/modules/json"),
    ("out", "http://basex.org/modules/out"),
    ("proc", "http://basex.org/modules/proc"),
    ("prof", "http://basex.org/modules/prof"),
    ("random", "http://basex.org/modules/random"),
    ("repo", "http://basex.org/modules/repo"),
    ("sql", "http://basex.org/modules/sql"),
    ("strings", "http://basex.org/modules/strings"),
    ("update", "http://basex.org/modules/update"),
    ("user", "http://basex.org/modules/user"),
    ("validate", "http://basex.org/modules/validate"),
    ("web", "http://basex.org/modules/web"),
    ("xquery", "http://basex.org/modules/xquery"),
    ("xslt", "http://basex.org/modules/xslt"),
    ("zip", "http://expath.org/ns/zip"),
];

const SAXON_ADDITIONS: &[PredefinedNamespace] = &[("saxon", "http://saxon.sf.net/")];

const EXISTDB_ADDITIONS: &[PredefinedNamespace] = &[
    ("exist", "http://exist.sourceforge.net/NS/exist"),
    ("request", "http://exist-db.org/xquery/request"),
    ("response", "http://exist-db.org/xquery/response"),
    ("session", "http://exist-db.org/xquery/session"),
    ("system", "http://exist-db.org/xquery/system"),
    ("transform", "http://exist-db.org/xquery/transform"),
    ("util", "http://exist-db.org/xquery/util"),
    ("xmldb", "http://exist-db.org/xquery/xmldb"),
];

/// Predefined namespaces for a vendor profile, sorted by prefix.
///
/// MarkLogic profiles report the union of every release's table so that
/// queries written against newer servers still resolve.
///
/// # Examples
///
/// ```
/// use xqstatic::dialect::VendorProfile;
/// use xqstatic::predefined::predefined_namespaces;
///
/// assert_eq!(predefined_namespaces(VendorProfile::W3C).len(), 8);
/// assert_eq!(predefined_namespaces(VendorProfile::marklogic(6)).len(), 29);
/// ```
pub fn predefined_namespaces(profile: VendorProfile) -> Vec<PredefinedNamespace> {
    let mut table: Vec<PredefinedNamespace> = match profile {
        VendorProfile::W3C => W3C_NAMESPACES.to_vec(),
        VendorProfile::MarkLogic { .. } => [MARKLOGIC_BASE, MARKLOGIC_ADDITIONS].concat(),
        VendorProfile::BaseX => [W3C_NAMESPACES, BASEX_ADDITIONS].concat(),
        VendorProfile::Saxon => [W3C_NAMESPACES, SAXON_ADDITIONS].concat(),
        VendorProfile::ExistDb => [W3C_NAMESPACES, EXISTDB_ADDITIONS].concat(),
    };
    table.sort_by(|a, b| a.0.cmp(b.0));
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_w3c_table_order() {
        let prefixes: Vec<_> = predefined_namespaces(VendorProfile::W3C)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(prefixes, vec!["array", "fn", "local", "map", "math", "xml", "xs", "xsi"]);
    }

    #[test]
    fn test_marklogic_table_is_release_union() {
        let table = predefined_namespaces(VendorProfile::marklogic(6));
        assert_eq!(table.len(), 29);
        assert!(!table.iter().any(|(p, _)| *p == "array"));
        assert_eq!(table.first(), Some(&("cts", CTS_NAMESPACE)));
        assert_eq!(table.last(), Some(&("xsi", XSI_NAMESPACE)));
        assert!(table.contains(&("map", MARKLOGIC_MAP_NAMESPACE)));
        assert!(table.contains(&("tde", "http://marklogic.com/xdmp/tde")));
    }

    #[test]
    fn test_vendor_tables_extend_w3c() {
        for profile in [VendorProfile::BaseX, VendorProfile::Saxon, VendorProfile::ExistDb] {
            let table = predefined_namespaces(profile);
            for binding in W3C_NAMESPACES {
                assert!(table.contains(binding), "{profile} is missing {binding:?}");
            }
            assert!(table.windows(2).all(|w| w[0].0 <= w[1].0));
        }
    }
}
