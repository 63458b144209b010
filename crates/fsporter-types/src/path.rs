//! Path descriptors tagged with their resolution state
//!
//! A [`PathDescriptor`] pairs a raw path with how far it has already been
//! resolved, so hot paths can skip redundant canonicalization. Resolution is
//! a pure, lexical operation: nothing here touches the filesystem.

use crate::error::TransferError;
use crate::result::Result;
use std::path::{Component, Path, PathBuf};

// Serde is imported conditionally through cfg_attr

/// How far a path has been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathFormat {
    /// Unprocessed caller input; full canonicalization and validation apply
    Relative,
    /// Already rooted; canonicalization is skipped, long-form conversion still applies
    Full,
    /// Fully resolved long-form path; used verbatim with zero processing
    LongFull,
}

/// A filesystem path plus its known resolution state
///
/// Immutable once created. [`PathDescriptor::resolve`] produces a new
/// descriptor in `LongFull` form; resolving a `LongFull` descriptor again is
/// the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathDescriptor {
    raw: PathBuf,
    format: PathFormat,
}

/// Device names reserved by Windows regardless of extension
const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

impl PathDescriptor {
    /// Create a descriptor with an explicit format tag
    ///
    /// The caller asserts the format; `Full` and `LongFull` inputs are
    /// trusted to be rooted and are not re-checked.
    pub fn new(path: impl Into<PathBuf>, format: PathFormat) -> Self {
        Self {
            raw: path.into(),
            format,
        }
    }

    /// Create a descriptor for unprocessed caller input
    pub fn relative(path: impl Into<PathBuf>) -> Self {
        Self::new(path, PathFormat::Relative)
    }

    /// Create a descriptor for a path known to be rooted
    pub fn full(path: impl Into<PathBuf>) -> Self {
        Self::new(path, PathFormat::Full)
    }

    /// Create a descriptor for a fully resolved long-form path
    pub fn long_full(path: impl Into<PathBuf>) -> Self {
        Self::new(path, PathFormat::LongFull)
    }

    /// Get the path
    pub fn as_path(&self) -> &Path {
        &self.raw
    }

    /// Get the resolution state
    pub fn format(&self) -> PathFormat {
        self.format
    }

    /// Consume the descriptor and return the path
    pub fn into_path_buf(self) -> PathBuf {
        self.raw
    }

    /// Resolve this descriptor into `LongFull` form
    ///
    /// `Relative` input is validated (illegal characters, reserved device
    /// names), absolutized against the current directory, and lexically
    /// normalized. `Full` input skips canonicalization but is still converted
    /// to long form. `LongFull` input is returned as-is.
    pub fn resolve(&self) -> Result<Self> {
        match self.format {
            PathFormat::LongFull => Ok(self.clone()),
            PathFormat::Full => Ok(Self {
                raw: to_long_form(self.raw.clone()),
                format: PathFormat::LongFull,
            }),
            PathFormat::Relative => {
                if self.raw.as_os_str().is_empty() {
                    return Err(TransferError::invalid_path(&self.raw, "path is empty"));
                }
                validate_components(&self.raw)?;
                let absolute = if self.raw.is_absolute() {
                    self.raw.clone()
                } else {
                    std::env::current_dir()?.join(&self.raw)
                };
                Ok(Self {
                    raw: to_long_form(normalize(&absolute)),
                    format: PathFormat::LongFull,
                })
            }
        }
    }
}

/// Reject components containing illegal characters or reserved device names
fn validate_components(path: &Path) -> Result<()> {
    for component in path.components() {
        let Component::Normal(name) = component else {
            continue;
        };
        let name = name.to_string_lossy();

        for c in name.chars() {
            if (c as u32) < 0x20 || matches!(c, '<' | '>' | '"' | '|' | '?' | '*' | ':') {
                return Err(TransferError::invalid_path(
                    path,
                    format!("component '{name}' contains an illegal character"),
                ));
            }
        }

        let stem = name.split('.').next().unwrap_or("");
        if RESERVED_DEVICE_NAMES
            .iter()
            .any(|reserved| stem.eq_ignore_ascii_case(reserved))
        {
            return Err(TransferError::invalid_path(
                path,
                format!("component '{name}' is a reserved device name"),
            ));
        }
    }
    Ok(())
}

/// Collapse `.` and `..` components lexically
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // Excess parent components above the root fall away
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Convert a rooted path to extended-length form
#[cfg(windows)]
fn to_long_form(path: PathBuf) -> PathBuf {
    use std::ffi::OsString;
    use std::path::Prefix;

    let Some(Component::Prefix(prefix)) = path.components().next() else {
        return path;
    };
    match prefix.kind() {
        Prefix::Verbatim(_) | Prefix::VerbatimUNC(..) | Prefix::VerbatimDisk(_) => path,
        Prefix::UNC(..) => {
            let s = path.as_os_str().to_string_lossy();
            PathBuf::from(format!(r"\\?\UNC\{}", s.trim_start_matches('\\')))
        }
        _ => {
            let mut out = OsString::from(r"\\?\");
            out.push(path.as_os_str());
            PathBuf::from(out)
        }
    }
}

/// On non-Windows platforms the long form is the full form
#[cfg(not(windows))]
fn to_long_form(path: PathBuf) -> PathBuf {
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_relative_resolution_produces_rooted_long_full() {
        let descriptor = PathDescriptor::relative("some/nested/file.txt");
        let resolved = descriptor.resolve().unwrap();

        assert_eq!(resolved.format(), PathFormat::LongFull);
        assert!(resolved.as_path().is_absolute());
        assert!(resolved.as_path().ends_with("some/nested/file.txt"));
    }

    #[test]
    fn test_resolution_collapses_dot_components() {
        let resolved = PathDescriptor::relative("a/./b/../c").resolve().unwrap();

        let rendered = resolved.as_path().to_string_lossy();
        assert!(rendered.ends_with("c"));
        assert!(!rendered.contains(".."));
        assert!(resolved.as_path().ends_with("a/c"));
    }

    #[test]
    fn test_long_full_resolution_is_identity() {
        let descriptor = PathDescriptor::long_full("/already/resolved");
        let resolved = descriptor.resolve().unwrap();

        assert_eq!(resolved, descriptor);
        assert_eq!(resolved.resolve().unwrap(), descriptor);
    }

    #[test]
    fn test_full_format_skips_validation() {
        // A '?' would be rejected on the relative path, but Full input is trusted
        let descriptor = PathDescriptor::full("/trusted/odd?name");
        let resolved = descriptor.resolve().unwrap();

        assert_eq!(resolved.format(), PathFormat::LongFull);
    }

    #[cfg(unix)]
    #[test]
    fn test_long_form_is_full_form_on_unix() {
        let resolved = PathDescriptor::full("/tmp/data").resolve().unwrap();
        assert_eq!(resolved.as_path(), Path::new("/tmp/data"));
    }

    #[cfg(windows)]
    #[test]
    fn test_long_form_gets_extended_prefix_on_windows() {
        let resolved = PathDescriptor::full(r"C:\data\file.bin").resolve().unwrap();
        assert!(resolved
            .as_path()
            .to_string_lossy()
            .starts_with(r"\\?\C:\"));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let error = PathDescriptor::relative("").resolve().unwrap_err();
        assert!(matches!(error, TransferError::InvalidPath { .. }));
    }

    #[rstest]
    #[case("bad|name.txt")]
    #[case("question?.log")]
    #[case("star*glob")]
    #[case("quo\"te")]
    #[case("less<than")]
    #[case("colon:name")]
    fn test_illegal_characters_rejected(#[case] name: &str) {
        let error = PathDescriptor::relative(name).resolve().unwrap_err();
        assert!(matches!(error, TransferError::InvalidPath { .. }));
    }

    #[test]
    fn test_control_characters_rejected() {
        let error = PathDescriptor::relative("bell\u{7}.txt").resolve().unwrap_err();
        assert!(matches!(error, TransferError::InvalidPath { .. }));
    }

    #[rstest]
    #[case("CON")]
    #[case("con")]
    #[case("PRN")]
    #[case("aux")]
    #[case("NUL.txt")]
    #[case("com3")]
    #[case("lpt9.log")]
    #[case("COM1.tar.gz")]
    fn test_reserved_device_names_rejected(#[case] name: &str) {
        let error = PathDescriptor::relative(name).resolve().unwrap_err();
        assert!(matches!(error, TransferError::InvalidPath { .. }));
    }

    #[rstest]
    #[case("CON10")]
    #[case("COM0")]
    #[case("console.txt")]
    #[case("NULL")]
    #[case("auxiliary")]
    fn test_reserved_lookalikes_allowed(#[case] name: &str) {
        assert!(PathDescriptor::relative(name).resolve().is_ok());
    }

    fn clean_segment_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,11}".prop_filter("reserved device names excluded", |s| {
            let stem = s.split('.').next().unwrap_or("");
            !RESERVED_DEVICE_NAMES
                .iter()
                .any(|reserved| stem.eq_ignore_ascii_case(reserved))
        })
    }

    proptest! {
        /// Resolving once and resolving twice must agree
        #[test]
        fn test_resolution_is_idempotent(
            segments in proptest::collection::vec(clean_segment_strategy(), 1..5)
        ) {
            let raw: PathBuf = segments.iter().collect();
            let once = PathDescriptor::relative(raw).resolve().unwrap();
            let twice = once.resolve().unwrap();

            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.format(), PathFormat::LongFull);
            prop_assert!(once.as_path().is_absolute());
        }
    }
}
