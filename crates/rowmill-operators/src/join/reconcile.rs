//! Reconciliation merge: four-flag synchronization of a target collection
//! against a source collection by identity key.

use std::str::FromStr;

use rowmill_core::prelude::*;

use crate::bucket::BucketIndex;

/// What happens to matched and unmatched rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeFlags {
    pub update_matched: bool,
    pub delete_matched: bool,
    pub insert_unmatched_source: bool,
    pub delete_unmatched_target: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeMode {
    Update,
    Delete,
    Insert,
    Upsert,
    /// Two-way sync: update matched, insert new, drop target rows the
    /// source no longer has.
    Full,
    Custom(MergeFlags),
}

impl MergeMode {
    pub fn flags(self) -> MergeFlags {
        match self {
            MergeMode::Update => MergeFlags {
                update_matched: true,
                ..MergeFlags::default()
            },
            MergeMode::Delete => MergeFlags {
                delete_matched: true,
                ..MergeFlags::default()
            },
            MergeMode::Insert => MergeFlags {
                insert_unmatched_source: true,
                ..MergeFlags::default()
            },
            MergeMode::Upsert => MergeFlags {
                update_matched: true,
                insert_unmatched_source: true,
                ..MergeFlags::default()
            },
            MergeMode::Full => MergeFlags {
                update_matched: true,
                insert_unmatched_source: true,
                delete_unmatched_target: true,
                ..MergeFlags::default()
            },
            MergeMode::Custom(flags) => flags,
        }
    }
}

impl FromStr for MergeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<MergeMode> {
        match s {
            "update" => Ok(MergeMode::Update),
            "delete" => Ok(MergeMode::Delete),
            "insert" => Ok(MergeMode::Insert),
            "upsert" => Ok(MergeMode::Upsert),
            "full" => Ok(MergeMode::Full),
            other => Err(Error::Config(format!(
                "merge mode '{other}' is not recognized; use one of: update, delete, insert, upsert, full"
            ))),
        }
    }
}

/// Synchronize `target` against `source`. The target is scanned from the
/// end backward so in-place removal by index stays sound; each target row
/// claims (removes) its source bucket, and unclaimed source buckets are
/// appended afterwards when inserting. A second target row with an
/// already-claimed key counts as unmatched. The returned collection
/// replaces the target wholesale.
pub fn reconcile<FT, FS>(
    mut target: Vec<Row>,
    source: Vec<Row>,
    target_key: &FT,
    source_key: &FS,
    mode: MergeMode,
) -> Vec<Row>
where
    FT: Fn(&Row) -> Value + ?Sized,
    FS: Fn(&Row) -> Value + ?Sized,
{
    let flags = mode.flags();
    let mut source_index = BucketIndex::build(source, source_key, false);

    for i in (0..target.len()).rev() {
        let sig = KeySig::of(&target_key(&target[i]));
        let bucket = source_index.take(&sig);
        match bucket.into_iter().next() {
            Some(replacement) => {
                if flags.delete_matched {
                    target.remove(i);
                } else if flags.update_matched {
                    target[i] = replacement;
                }
            }
            None => {
                if flags.delete_unmatched_target {
                    target.remove(i);
                }
            }
        }
    }

    if flags.insert_unmatched_source {
        for bucket in source_index.into_buckets() {
            if let Some(first) = bucket.into_iter().next() {
                target.push(first);
            }
        }
    }

    target
}
