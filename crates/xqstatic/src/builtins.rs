//
// builtins.rs
//
// Built-in function catalogs for each vendor profile
//

use crate::dialect::{DialectConfig, LanguageVersion, VendorProfile};
use crate::functions::ArityRange;
use crate::predefined::{
    ARRAY_NAMESPACE, CTS_NAMESPACE, FN_NAMESPACE, MAP_NAMESPACE, MARKLOGIC_JSON_NAMESPACE,
    MARKLOGIC_MAP_NAMESPACE, MARKLOGIC_MATH_NAMESPACE, MATH_NAMESPACE, XDMP_NAMESPACE,
    XS_NAMESPACE,
};

use crate::dialect::LanguageVersion::{XQuery10 as V10, XQuery30 as V30, XQuery31 as V31};

/// One overload of a built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub local_name: &'static str,
    pub arity: ArityRange,
    /// First language version providing this overload.
    pub since: LanguageVersion,
}

const fn sig(local_name: &'static str, arity: u32, since: LanguageVersion) -> Signature {
    Signature {
        local_name,
        arity: ArityRange::fixed(arity),
        since,
    }
}

const fn variadic(local_name: &'static str, min: u32, since: LanguageVersion) -> Signature {
    Signature {
        local_name,
        arity: ArityRange::variadic(min),
        since,
    }
}

/// Built-in functions of one namespace, in catalog order.
///
/// Overloads of a name are listed from the highest arity down; resolution
/// reports them in this order.
#[derive(Debug)]
pub struct FunctionTable {
    pub namespace: &'static str,
    pub functions: &'static [Signature],
}

// ============================================================================
// W3C function library
// ============================================================================

const FN_FUNCTIONS: &[Signature] = &[
    sig("abs", 1, V10),
    sig("adjust-date-to-timezone", 2, V10),
    sig("adjust-date-to-timezone", 1, V10),
    sig("adjust-dateTime-to-timezone", 2, V10),
    sig("adjust-dateTime-to-timezone", 1, V10),
    sig("adjust-time-to-timezone", 2, V10),
    sig("adjust-time-to-timezone", 1, V10),
    sig("analyze-string", 3, V30),
    sig("analyze-string", 2, V30),
    sig("apply", 2, V31),
    sig("available-environment-variables", 0, V30),
    sig("avg", 1, V10),
    sig("base-uri", 1, V10),
    sig("base-uri", 0, V10),
    sig("boolean", 1, V10),
    sig("ceiling", 1, V10),
    sig("codepoint-equal", 2, V10),
    sig("codepoints-to-string", 1, V10),
    sig("collection", 1, V10),
    sig("collection", 0, V10),
    sig("compare", 3, V10),
    sig("compare", 2, V10),
    variadic("concat", 2, V10),
    sig("concat", 1, V10),
    sig("concat", 0, V10),
    sig("contains", 3, V10),
    sig("contains", 2, V10),
    sig("contains-token", 3, V31),
    sig("contains-token", 2, V31),
    sig("count", 1, V10),
    sig("current-date", 0, V10),
    sig("current-dateTime", 0, V10),
    sig("current-time", 0, V10),
    sig("data", 1, V10),
    sig("data", 0, V30),
    sig("dateTime", 2, V10),
    sig("day-from-date", 1, V10),
    sig("day-from-dateTime", 1, V10),
    sig("days-from-duration", 1, V10),
    sig("deep-equal", 3, V10),
    sig("deep-equal", 2, V10),
    sig("default-collation", 0, V10),
    sig("default-language", 0, V31),
    sig("distinct-values", 2, V10),
    sig("distinct-values", 1, V10),
    sig("doc", 1, V10),
    sig("doc-available", 1, V10),
    sig("document-uri", 1, V10),
    sig("document-uri", 0, V30),
    sig("element-with-id", 2, V30),
    sig("element-with-id", 1, V30),
    sig("empty", 1, V10),
    sig("encode-for-uri", 1, V10),
    sig("ends-with", 3, V10),
    sig("ends-with", 2, V10),
    sig("environment-variable", 1, V30),
    sig("error", 3, V10),
    sig("error", 2, V10),
    sig("error", 1, V10),
    sig("error", 0, V10),
    sig("escape-html-uri", 1, V10),
    sig("exactly-one", 1, V10),
    sig("exists", 1, V10),
    sig("false", 0, V10),
    sig("filter", 2, V30),
    sig("floor", 1, V10),
    sig("fold-left", 3, V30),
    sig("fold-right", 3, V30),
    sig("for-each", 2, V30),
    sig("for-each-pair", 3, V30),
    sig("format-date", 5, V30),
    sig("format-date", 2, V30),
    sig("format-dateTime", 5, V30),
    sig("format-dateTime", 2, V30),
    sig("format-integer", 3, V30),
    sig("format-integer", 2, V30),
    sig("format-number", 3, V30),
    sig("format-number", 2, V30),
    sig("format-time", 5, V30),
    sig("format-time", 2, V30),
    sig("function-arity", 1, V30),
    sig("function-lookup", 2, V30),
    sig("function-name", 1, V30),
    sig("generate-id", 1, V30),
    sig("generate-id", 0, V30),
    sig("has-children", 1, V30),
    sig("has-children", 0, V30),
    sig("head", 1, V30),
    sig("hours-from-dateTime", 1, V10),
    sig("hours-from-duration", 1, V10),
    sig("hours-from-time", 1, V10),
    sig("id", 2, V10),
    sig("id", 1, V10),
    sig("idref", 2, V10),
    sig("idref", 1, V10),
    sig("implicit-timezone", 0, V10),
    sig("in-scope-prefixes", 1, V10),
    sig("index-of", 3, V10),
    sig("index-of", 2, V10),
    sig("innermost", 1, V30),
    sig("insert-before", 3, V10),
    sig("iri-to-uri", 1, V10),
    sig("json-doc", 2, V31),
    sig("json-doc", 1, V31),
    sig("json-to-xml", 2, V31),
    sig("json-to-xml", 1, V31),
    sig("lang", 2, V10),
    sig("lang", 1, V10),
    sig("last", 0, V10),
    sig("load-xquery-module", 2, V31),
    sig("load-xquery-module", 1, V31),
    sig("local-name", 1, V10),
    sig("local-name", 0, V10),
    sig("lower-case", 1, V10),
    sig("matches", 3, V10),
    sig("matches", 2, V10),
    sig("max", 2, V10),
    sig("max", 1, V10),
    sig("min", 2, V10),
    sig("min", 1, V10),
    sig("minutes-from-dateTime", 1, V10),
    sig("month-from-date", 1, V10),
    sig("name", 1, V10),
    sig("name", 0, V10),
    sig("namespace-uri", 1, V10),
    sig("namespace-uri", 0, V10),
    sig("namespace-uri-for-prefix", 2, V10),
    sig("node-name", 1, V10),
    sig("node-name", 0, V30),
    sig("normalize-space", 1, V10),
    sig("normalize-space", 0, V10),
    sig("normalize-unicode", 2, V10),
    sig("normalize-unicode", 1, V10),
    sig("not", 1, V10),
    sig("number", 1, V10),
    sig("number", 0, V10),
    sig("one-or-more", 1, V10),
    sig("outermost", 1, V30),
    sig("parse-ietf-date", 1, V31),
    sig("parse-json", 2, V31),
    sig("parse-json", 1, V31),
    sig("parse-xml", 1, V30),
    sig("parse-xml-fragment", 1, V30),
    sig("path", 1, V30),
    sig("path", 0, V30),
    sig("position", 0, V10),
    sig("random-number-generator", 1, V31),
    sig("random-number-generator", 0, V31),
    sig("remove", 2, V10),
    sig("replace", 4, V10),
    sig("replace", 3, V10),
    sig("resolve-QName", 2, V10),
    sig("resolve-uri", 2, V10),
    sig("resolve-uri", 1, V10),
    sig("reverse", 1, V10),
    sig("root", 1, V10),
    sig("root", 0, V10),
    sig("round", 2, V30),
    sig("round", 1, V10),
    sig("round-half-to-even", 2, V10),
    sig("round-half-to-even", 1, V10),
    sig("serialize", 2, V30),
    sig("serialize", 1, V30),
    sig("sort", 3, V31),
    sig("sort", 2, V31),
    sig("sort", 1, V31),
    sig("starts-with", 3, V10),
    sig("starts-with", 2, V10),
    sig("static-base-uri", 0, V10),
    sig("string", 1, V10),
    sig("string", 0, V10),
    sig("string-join", 2, V10),
    sig("string-join", 1, V30),
    sig("string-length", 1, V10),
    sig("string-length", 0, V10),
    sig("string-to-codepoints", 1, V10),
    sig("subsequence", 3, V10),
    sig("subsequence", 2, V10),
    sig("substring", 3, V10),
    sig("substring", 2, V10),
    sig("substring-after", 3, V10),
    sig("substring-after", 2, V10),
    sig("substring-before", 3, V10),
    sig("substring-before", 2, V10),
    sig("sum", 2, V10),
    sig("sum", 1, V10),
    sig("tail", 1, V30),
    sig("tokenize", 3, V10),
    sig("tokenize", 2, V10),
    sig("tokenize", 1, V31),
    sig("trace", 2, V10),
    sig("trace", 1, V31),
    sig("translate", 3, V10),
    sig("true", 0, V10),
    sig("unordered", 1, V10),
    sig("unparsed-text", 2, V30),
    sig("unparsed-text", 1, V30),
    sig("unparsed-text-available", 2, V30),
    sig("unparsed-text-available", 1, V30),
    sig("unparsed-text-lines", 2, V30),
    sig("unparsed-text-lines", 1, V30),
    sig("upper-case", 1, V10),
    sig("uri-collection", 1, V30),
    sig("uri-collection", 0, V30),
    sig("xml-to-json", 2, V31),
    sig("xml-to-json", 1, V31),
    sig("year-from-date", 1, V10),
    sig("zero-or-one", 1, V10),
];

const MATH_FUNCTIONS: &[Signature] = &[
    sig("acos", 1, V30),
    sig("asin", 1, V30),
    sig("atan", 1, V30),
    sig("atan2", 2, V30),
    sig("cos", 1, V30),
    sig("exp", 1, V30),
    sig("exp10", 1, V30),
    sig("log", 1, V30),
    sig("log10", 1, V30),
    sig("pi", 0, V30),
    sig("pow", 2, V30),
    sig("sin", 1, V30),
    sig("sqrt", 1, V30),
    sig("tan", 1, V30),
];

const MAP_FUNCTIONS: &[Signature] = &[
    sig("contains", 2, V31),
    sig("entry", 2, V31),
    sig("find", 2, V31),
    sig("for-each", 2, V31),
    sig("get", 2, V31),
    sig("keys", 1, V31),
    sig("merge", 2, V31),
    sig("merge", 1, V31),
    sig("put", 3, V31),
    sig("remove", 2, V31),
    sig("size", 1, V31),
];

const ARRAY_FUNCTIONS: &[Signature] = &[
    sig("append", 2, V31),
    sig("filter", 2, V31),
    sig("flatten", 1, V31),
    sig("fold-left", 3, V31),
    sig("fold-right", 3, V31),
    sig("for-each", 2, V31),
    sig("for-each-pair", 3, V31),
    sig("get", 2, V31),
    sig("head", 1, V31),
    sig("insert-before", 3, V31),
    sig("join", 1, V31),
    sig("put", 3, V31),
    sig("remove", 2, V31),
    sig("reverse", 1, V31),
    sig("size", 1, V31),
    sig("sort", 3, V31),
    sig("sort", 2, V31),
    sig("sort", 1, V31),
    sig("subarray", 3, V31),
    sig("subarray", 2, V31),
    sig("tail", 1, V31),
];

/// Constructor functions for the built-in atomic types.
const XS_CONSTRUCTORS: &[Signature] = &[
    sig("anyURI", 1, V10),
    sig("base64Binary", 1, V10),
    sig("boolean", 1, V10),
    sig("byte", 1, V10),
    sig("date", 1, V10),
    sig("dateTime", 1, V10),
    sig("dateTimeStamp", 1, V30),
    sig("dayTimeDuration", 1, V10),
    sig("decimal", 1, V10),
    sig("double", 1, V10),
    sig("duration", 1, V10),
    sig("ENTITY", 1, V10),
    sig("float", 1, V10),
    sig("gDay", 1, V10),
    sig("gMonth", 1, V10),
    sig("gMonthDay", 1, V10),
    sig("gYear", 1, V10),
    sig("gYearMonth", 1, V10),
    sig("hexBinary", 1, V10),
    sig("ID", 1, V10),
    sig("IDREF", 1, V10),
    sig("int", 1, V10),
    sig("integer", 1, V10),
    sig("language", 1, V10),
    sig("long", 1, V10),
    sig("Name", 1, V10),
    sig("NCName", 1, V10),
    sig("negativeInteger", 1, V10),
    sig("NMTOKEN", 1, V10),
    sig("nonNegativeInteger", 1, V10),
    sig("nonPositiveInteger", 1, V10),
    sig("normalizedString", 1, V10),
    sig("positiveInteger", 1, V10),
    sig("QName", 1, V10),
    sig("short", 1, V10),
    sig("string", 1, V10),
    sig("time", 1, V10),
    sig("token", 1, V10),
    sig("unsignedByte", 1, V10),
    sig("unsignedInt", 1, V10),
    sig("unsignedLong", 1, V10),
    sig("unsignedShort", 1, V10),
    sig("untypedAtomic", 1, V10),
    sig("yearMonthDuration", 1, V10),
];

const W3C_CATALOG: &[FunctionTable] = &[
    FunctionTable { namespace: FN_NAMESPACE, functions: FN_FUNCTIONS },
    FunctionTable { namespace: MATH_NAMESPACE, functions: MATH_FUNCTIONS },
    FunctionTable { namespace: MAP_NAMESPACE, functions: MAP_FUNCTIONS },
    FunctionTable { namespace: ARRAY_NAMESPACE, functions: ARRAY_FUNCTIONS },
    FunctionTable { namespace: XS_NAMESPACE, functions: XS_CONSTRUCTORS },
];

// ============================================================================
// Vendor libraries
// ============================================================================

const ML_MATH_FUNCTIONS: &[Signature] = &[
    sig("acos", 1, V10),
    sig("asin", 1, V10),
    sig("atan", 1, V10),
    sig("atan2", 2, V10),
    sig("cos", 1, V10),
    sig("exp", 1, V10),
    sig("log", 1, V10),
    sig("log10", 1, V10),
    sig("median", 1, V10),
    sig("pi", 0, V10),
    sig("pow", 2, V10),
    sig("sin", 1, V10),
    sig("sqrt", 1, V10),
    sig("stddev", 1, V10),
    sig("tan", 1, V10),
    sig("trunc", 2, V10),
    sig("trunc", 1, V10),
    sig("variance", 1, V10),
];

const ML_MAP_FUNCTIONS: &[Signature] = &[
    sig("clear", 1, V10),
    sig("contains", 2, V10),
    sig("count", 1, V10),
    sig("delete", 2, V10),
    sig("entry", 2, V10),
    sig("get", 2, V10),
    sig("keys", 1, V10),
    sig("map", 1, V10),
    sig("map", 0, V10),
    sig("new", 1, V10),
    sig("new", 0, V10),
    sig("put", 3, V10),
];

const ML_JSON_FUNCTIONS: &[Signature] = &[
    sig("array", 1, V10),
    sig("array", 0, V10),
    sig("array-pop", 1, V10),
    sig("array-push", 2, V10),
    sig("array-resize", 3, V10),
    sig("array-resize", 2, V10),
    sig("array-size", 1, V10),
    sig("array-values", 2, V10),
    sig("array-values", 1, V10),
    sig("null", 0, V10),
    sig("object", 1, V10),
    sig("object", 0, V10),
    sig("object-define", 1, V10),
    sig("object-define", 0, V10),
    sig("set-item-at", 3, V10),
    sig("subarray", 3, V10),
    sig("subarray", 2, V10),
    sig("to-array", 3, V10),
    sig("to-array", 2, V10),
    sig("to-array", 1, V10),
    sig("to-array", 0, V10),
];

const XDMP_FUNCTIONS: &[Signature] = &[
    sig("document-insert", 4, V10),
    sig("document-insert", 3, V10),
    sig("document-insert", 2, V10),
    sig("eval", 3, V10),
    sig("eval", 2, V10),
    sig("eval", 1, V10),
    sig("get-request-field", 2, V10),
    sig("get-request-field", 1, V10),
    sig("invoke", 3, V10),
    sig("invoke", 2, V10),
    sig("invoke", 1, V10),
    sig("log", 2, V10),
    sig("log", 1, V10),
    sig("node-uri", 1, V10),
    sig("quote", 2, V10),
    sig("quote", 1, V10),
    sig("random", 1, V10),
    sig("random", 0, V10),
    sig("set", 2, V10),
    sig("sleep", 1, V10),
    sig("unquote", 3, V10),
    sig("unquote", 2, V10),
    sig("unquote", 1, V10),
    sig("version", 0, V10),
];

const CTS_FUNCTIONS: &[Signature] = &[
    sig("and-query", 2, V10),
    sig("and-query", 1, V10),
    sig("collection-query", 1, V10),
    sig("directory-query", 2, V10),
    sig("directory-query", 1, V10),
    sig("element-value-query", 4, V10),
    sig("element-value-query", 3, V10),
    sig("element-value-query", 2, V10),
    sig("estimate", 3, V10),
    sig("estimate", 2, V10),
    sig("estimate", 1, V10),
    sig("not-query", 1, V10),
    sig("or-query", 2, V10),
    sig("or-query", 1, V10),
    sig("search", 5, V10),
    sig("search", 4, V10),
    sig("search", 3, V10),
    sig("search", 2, V10),
    sig("uris", 5, V10),
    sig("uris", 4, V10),
    sig("uris", 3, V10),
    sig("uris", 2, V10),
    sig("uris", 1, V10),
    sig("uris", 0, V10),
    sig("word-query", 3, V10),
    sig("word-query", 2, V10),
    sig("word-query", 1, V10),
];

const MARKLOGIC_CATALOG: &[FunctionTable] = &[
    FunctionTable { namespace: FN_NAMESPACE, functions: FN_FUNCTIONS },
    FunctionTable { namespace: XS_NAMESPACE, functions: XS_CONSTRUCTORS },
    FunctionTable { namespace: MARKLOGIC_MATH_NAMESPACE, functions: ML_MATH_FUNCTIONS },
    FunctionTable { namespace: MARKLOGIC_MAP_NAMESPACE, functions: ML_MAP_FUNCTIONS },
    FunctionTable { namespace: MARKLOGIC_JSON_NAMESPACE, functions: ML_JSON_FUNCTIONS },
    FunctionTable { namespace: XDMP_NAMESPACE, functions: XDMP_FUNCTIONS },
    FunctionTable { namespace: CTS_NAMESPACE, functions: CTS_FUNCTIONS },
];

const BASEX_TABLES: &[FunctionTable] = &[
    FunctionTable {
        namespace: "http://basex.org/modules/db",
        functions: &[
            sig("list", 2, V10),
            sig("list", 1, V10),
            sig("list", 0, V10),
            sig("open", 2, V10),
            sig("open", 1, V10),
        ],
    },
    FunctionTable {
        namespace: "http://expath.org/ns/file",
        functions: &[
            sig("exists", 1, V10),
            sig("read-text", 2, V10),
            sig("read-text", 1, V10),
        ],
    },
    FunctionTable {
        namespace: "http://basex.org/modules/xquery",
        functions: &[sig("eval", 3, V10), sig("eval", 2, V10), sig("eval", 1, V10)],
    },
];

const SAXON_TABLES: &[FunctionTable] = &[FunctionTable {
    namespace: "http://saxon.sf.net/",
    functions: &[
        sig("evaluate", 1, V10),
        sig("parse", 1, V10),
        sig("serialize", 2, V10),
    ],
}];

const EXISTDB_TABLES: &[FunctionTable] = &[
    FunctionTable {
        namespace: "http://exist-db.org/xquery/util",
        functions: &[sig("log", 2, V10)],
    },
    FunctionTable {
        namespace: "http://exist-db.org/xquery/xmldb",
        functions: &[sig("store", 4, V10), sig("store", 3, V10)],
    },
    FunctionTable {
        namespace: "http://exist-db.org/xquery/request",
        functions: &[sig("get-parameter", 3, V10), sig("get-parameter", 2, V10)],
    },
];

/// Catalog tables consulted for a vendor profile, in precedence order.
pub fn catalog(profile: VendorProfile) -> impl Iterator<Item = &'static FunctionTable> {
    let (core, vendor): (&'static [FunctionTable], &'static [FunctionTable]) = match profile {
        VendorProfile::W3C => (W3C_CATALOG, &[]),
        VendorProfile::MarkLogic { .. } => (MARKLOGIC_CATALOG, &[]),
        VendorProfile::BaseX => (W3C_CATALOG, BASEX_TABLES),
        VendorProfile::Saxon => (W3C_CATALOG, SAXON_TABLES),
        VendorProfile::ExistDb => (W3C_CATALOG, EXISTDB_TABLES),
    };
    core.iter().chain(vendor.iter())
}

/// Built-in overloads of `namespace:local_name` available in `dialect`, in
/// catalog order.
///
/// # Examples
///
/// ```
/// use xqstatic::builtins::lookup;
/// use xqstatic::dialect::DialectConfig;
/// use xqstatic::predefined::FN_NAMESPACE;
///
/// let arities: Vec<_> = lookup(DialectConfig::default(), FN_NAMESPACE, "data")
///     .map(|s| s.arity.min)
///     .collect();
/// assert_eq!(arities, vec![1, 0]);
/// ```
pub fn lookup<'a>(
    dialect: DialectConfig,
    namespace: &'a str,
    local_name: &'a str,
) -> impl Iterator<Item = &'static Signature> + 'a {
    catalog(dialect.vendor_profile)
        .filter(move |table| table.namespace == namespace)
        .flat_map(|table| table.functions.iter())
        .filter(move |s| s.local_name == local_name && dialect.language_version.supports(s.since))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arities(dialect: DialectConfig, ns: &str, name: &str) -> Vec<ArityRange> {
        lookup(dialect, ns, name).map(|s| s.arity).collect()
    }

    #[test]
    fn test_concat_overloads_in_catalog_order() {
        assert_eq!(
            arities(DialectConfig::default(), FN_NAMESPACE, "concat"),
            vec![ArityRange::variadic(2), ArityRange::fixed(1), ArityRange::fixed(0)]
        );
    }

    #[test]
    fn test_version_filters_overloads() {
        let v10 = DialectConfig::new(LanguageVersion::XQuery10, VendorProfile::W3C);
        assert_eq!(arities(v10, FN_NAMESPACE, "data"), vec![ArityRange::fixed(1)]);
        assert!(arities(v10, MAP_NAMESPACE, "get").is_empty());
    }

    #[test]
    fn test_marklogic_catalog_uses_vendor_namespaces() {
        let ml = DialectConfig::marklogic(9);
        assert_eq!(
            arities(ml, MARKLOGIC_JSON_NAMESPACE, "array"),
            vec![ArityRange::fixed(1), ArityRange::fixed(0)]
        );
        assert!(arities(ml, MAP_NAMESPACE, "get").is_empty());
        assert_eq!(arities(ml, MARKLOGIC_MAP_NAMESPACE, "get"), vec![ArityRange::fixed(2)]);
    }

    #[test]
    fn test_vendor_tables_follow_w3c_core() {
        let tables: Vec<_> = catalog(VendorProfile::BaseX).map(|t| t.namespace).collect();
        assert_eq!(tables.first(), Some(&FN_NAMESPACE));
        assert!(tables.contains(&"http://basex.org/modules/db"));
    }

    #[test]
    fn test_overloads_are_grouped_highest_arity_first() {
        for table in catalog(VendorProfile::W3C).chain(catalog(VendorProfile::marklogic(10))) {
            for pair in table.functions.windows(2) {
                if pair[0].local_name == pair[1].local_name {
                    assert!(
                        pair[0].arity.min > pair[1].arity.min,
                        "{}#{} listed before #{}",
                        pair[0].local_name,
                        pair[0].arity.min,
                        pair[1].arity.min
                    );
                }
            }
        }
    }
}
