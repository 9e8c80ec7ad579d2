//! Annotation namespaces and well-known names.

pub const CANONICAL_PREFIX: &str = "androidx.annotation.";
pub const SUPPORT_PREFIX: &str = "android.support.annotation.";
pub const PLATFORM_PREFIX: &str = "android.annotation.";
pub const GENERIC_PREFIX: &str = "java.lang.";

/// The one generic-namespace annotation that is always kept
pub const RETENTION: &str = "java.lang.annotation.Retention";
pub const RETENTION_POLICY: &str = "java.lang.annotation.RetentionPolicy";

pub const RESOURCE_TYPE_SUFFIX: &str = "Res";

pub const NULLABLE: &str = "androidx.annotation.Nullable";
pub const NON_NULL: &str = "androidx.annotation.NonNull";
pub const KEEP: &str = "androidx.annotation.Keep";
pub const INT_DEF: &str = "androidx.annotation.IntDef";
pub const STRING_DEF: &str = "androidx.annotation.StringDef";
pub const MAGIC_CONSTANT: &str = "org.intellij.lang.annotation.MagicConstant";

const NULLABLE_ALIASES: &[&str] = &[
    NULLABLE,
    "android.support.annotation.Nullable",
    "android.annotation.Nullable",
    "org.jetbrains.annotations.Nullable",
    "javax.annotation.Nullable",
];

const NON_NULL_ALIASES: &[&str] = &[
    NON_NULL,
    "android.support.annotation.NonNull",
    "android.annotation.NonNull",
    "org.jetbrains.annotations.NotNull",
    "javax.annotation.Nonnull",
];

/// Simple names of typedef markers (values restricted to named constants)
const TYPEDEF_MARKERS: &[&str] = &["IntDef", "LongDef", "StringDef"];

/// Simple names of range markers
const RANGE_MARKERS: &[&str] = &["IntRange", "FloatRange"];

/// Platform annotations that only matter to tooling and are never exported
const PLATFORM_TOOL_ONLY: &[&str] = &[
    "SuppressLint",
    "TargetApi",
    "SystemApi",
    "TestApi",
    "Widget",
    "SdkConstant",
    "Hide",
];

/// Canonical names known to be source-retained
const SOURCE_RETAINED: &[&str] = &[
    "androidx.annotation.IntDef",
    "androidx.annotation.LongDef",
    "androidx.annotation.StringDef",
    "androidx.annotation.CallSuper",
    "androidx.annotation.CheckResult",
    "androidx.annotation.ColorInt",
    "androidx.annotation.ColorLong",
    "androidx.annotation.Dimension",
    "androidx.annotation.Px",
    "androidx.annotation.RequiresPermission",
    "androidx.annotation.Size",
    "androidx.annotation.UiThread",
    "androidx.annotation.MainThread",
    "androidx.annotation.WorkerThread",
    "androidx.annotation.BinderThread",
    "androidx.annotation.AnyThread",
    MAGIC_CONSTANT,
];

/// Canonical names known to be class-retained
const CLASS_RETAINED: &[&str] = &[
    "androidx.annotation.Keep",
    "androidx.annotation.NonNull",
    "androidx.annotation.Nullable",
    "androidx.annotation.IntRange",
    "androidx.annotation.FloatRange",
    "androidx.annotation.RequiresApi",
    "androidx.annotation.RestrictTo",
    "androidx.annotation.VisibleForTesting",
    "androidx.annotation.HalfFloat",
    RETENTION,
];

/// Retention policy of an annotation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Retention {
    Source,
    Class,
    Runtime,
}

impl Retention {
    /// Parse a `RetentionPolicy` constant name, qualified or not
    pub fn from_policy(value: &str) -> Option<Self> {
        match value.rsplit('.').next()? {
            "SOURCE" => Some(Retention::Source),
            "CLASS" => Some(Retention::Class),
            "RUNTIME" => Some(Retention::Runtime),
            _ => None,
        }
    }
}

/// Retention of a well-known canonical name, if it is in the fixed table
pub fn known_retention(canonical: &str) -> Option<Retention> {
    if SOURCE_RETAINED.contains(&canonical) {
        Some(Retention::Source)
    } else if CLASS_RETAINED.contains(&canonical) {
        Some(Retention::Class)
    } else {
        None
    }
}

pub fn is_nullable(name: &str) -> bool {
    NULLABLE_ALIASES.contains(&name)
}

pub fn is_non_null(name: &str) -> bool {
    NON_NULL_ALIASES.contains(&name)
}

/// Canonical nullability name for any supported alias
pub fn canonical_nullability(name: &str) -> Option<&'static str> {
    if is_nullable(name) {
        Some(NULLABLE)
    } else if is_non_null(name) {
        Some(NON_NULL)
    } else {
        None
    }
}

/// Whether two canonical names are the opposite nullability markers
pub fn is_nullability_conflict(a: &str, b: &str) -> bool {
    (a == NULLABLE && b == NON_NULL) || (a == NON_NULL && b == NULLABLE)
}

pub fn is_keep(name: &str) -> bool {
    name == KEEP || name == "android.support.annotation.Keep" || name == "android.annotation.Keep"
}

/// Strip one of the Android annotation namespaces, returning the simple name
fn android_simple_name(name: &str) -> Option<&str> {
    [CANONICAL_PREFIX, SUPPORT_PREFIX, PLATFORM_PREFIX]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
}

/// `IntDef`, `LongDef` or `StringDef` in any Android namespace
pub fn is_typedef_marker(name: &str) -> bool {
    android_simple_name(name)
        .map(|simple| TYPEDEF_MARKERS.contains(&simple))
        .unwrap_or(false)
}

/// Direct typedef/range marker, including IntelliJ's `MagicConstant`
pub fn is_magic_marker(name: &str) -> bool {
    if name == MAGIC_CONSTANT {
        return true;
    }
    android_simple_name(name)
        .map(|simple| TYPEDEF_MARKERS.contains(&simple) || RANGE_MARKERS.contains(&simple))
        .unwrap_or(false)
}

pub fn is_platform_tool_only(name: &str) -> bool {
    name.strip_prefix(PLATFORM_PREFIX)
        .map(|simple| PLATFORM_TOOL_ONLY.contains(&simple))
        .unwrap_or(false)
}

/// Rewrite a legacy support or platform name into the canonical namespace
pub fn to_canonical(name: &str) -> String {
    if let Some(simple) = name
        .strip_prefix(SUPPORT_PREFIX)
        .or_else(|| name.strip_prefix(PLATFORM_PREFIX))
    {
        format!("{}{}", CANONICAL_PREFIX, simple)
    } else {
        name.to_string()
    }
}
