// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Undo the hash fragments repair tools insert into bundled library names.
//!
//! `delvewheel` renames `foo.dll` to `foo-<hash>.dll`, while `auditwheel`
//! and `delocate` insert the hash after the first dot-delimited segment,
//! so `libfoo.so.1` becomes `libfoo-<hash>.so.1`.

use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(test)]
#[path = "./mangle_test.rs"]
mod mangle_test;

/// Minimum length of the hex fragment a repair tool inserts.
pub const MIN_HASH_LEN: usize = 8;

static RE_MANGLED_DLL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<stem>.+)-[0-9a-fA-F]{{{MIN_HASH_LEN},}}(?P<ext>(?i:\.dll))$"
    ))
    .unwrap()
});

static RE_MANGLED_GENERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<first>[^.]+)-[0-9a-fA-F]{{{MIN_HASH_LEN},}}(?P<rest>\..*)$"
    ))
    .unwrap()
});

static RE_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^[0-9a-fA-F]{{{MIN_HASH_LEN},}}$")).unwrap());

/// A known way a repair tool renames a bundled library.
///
/// Variants are listed in the order [`unmangle`] tries them. The DLL form
/// must go first: a mangled DLL can also satisfy the generic shape and
/// would then be split at the wrong place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mangling {
    /// `<stem>-<hash>.dll`
    Dll,
    /// `<first segment>-<hash><.rest>`
    Generic,
}

impl Mangling {
    pub const ALL: [Mangling; 2] = [Mangling::Dll, Mangling::Generic];

    fn pattern(self) -> &'static Regex {
        match self {
            Mangling::Dll => Lazy::force(&RE_MANGLED_DLL),
            Mangling::Generic => Lazy::force(&RE_MANGLED_GENERIC),
        }
    }

    /// Rename `file_name` the way the repair tool would, inserting `hash`.
    ///
    /// Returns `None` when the name does not have the shape this mangling
    /// applies to or `hash` is not at least [`MIN_HASH_LEN`] hex digits.
    pub fn apply(self, file_name: &str, hash: &str) -> Option<String> {
        if !RE_HASH.is_match(hash) {
            return None;
        }
        match self {
            Mangling::Dll => {
                let split = file_name.len().checked_sub(4)?;
                let (stem, ext) = (file_name.get(..split)?, file_name.get(split..)?);
                if stem.is_empty() || !ext.eq_ignore_ascii_case(".dll") {
                    return None;
                }
                Some(format!("{stem}-{hash}{ext}"))
            }
            Mangling::Generic => {
                let (first, rest) = file_name.split_once('.')?;
                if first.is_empty() {
                    return None;
                }
                Some(format!("{first}-{hash}.{rest}"))
            }
        }
    }

    /// Strip the hash fragment if `file_name` has this mangling's shape.
    pub fn undo(self, file_name: &str) -> Option<String> {
        let captures = self.pattern().captures(file_name)?;
        let (head, tail) = match self {
            Mangling::Dll => ("stem", "ext"),
            Mangling::Generic => ("first", "rest"),
        };
        Some(format!("{}{}", &captures[head], &captures[tail]))
    }
}

/// Recover the original name of a bundled library.
///
/// The first mangling whose shape matches decides the result; `None` means
/// the name does not look mangled at all.
pub fn unmangle(file_name: &str) -> Option<String> {
    Mangling::ALL
        .iter()
        .find_map(|mangling| mangling.undo(file_name))
}
