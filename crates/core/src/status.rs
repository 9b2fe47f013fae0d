//! Status enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table. These enums are the only
//! place status names are spelled out; everything else goes through them.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Lowercase and strip separators so `PendingWitnessConfirmation`,
/// `pending_witness_confirmation` and `Pending Witness Confirmation` compare equal.
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
        $( aliases { $( $alias:literal => $target:ident ),* $(,)? } )?
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant in seed-data order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Map a database status ID back to its variant.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( x if x == $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Canonical PascalCase name, identical to the serialized form.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }

            /// Like [`from_id`](Self::from_id) but reports unknown ids as an
            /// internal error, for rows read back from the database.
            pub fn try_from_id(id: StatusId) -> Result<Self, CoreError> {
                Self::from_id(id).ok_or_else(|| {
                    CoreError::Internal(format!(
                        "Unknown {} id {id}",
                        stringify!($name)
                    ))
                })
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = normalize(value);
                $( $( if normalized == $alias { return Ok($name::$target); } )* )?
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize(v.as_str()) == normalized)
                    .ok_or_else(|| {
                        let valid: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        CoreError::Validation(format!(
                            "Invalid {} '{value}'. Must be one of: {}",
                            stringify!($name),
                            valid.join(", ")
                        ))
                    })
            }
        }
    };
}

define_status_enum! {
    /// Finding lifecycle status.
    FindingStatus {
        Open = 1,
        Received = 2,
        PendingWitnessConfirmation = 3,
        Confirmed = 4,
        WitnessDisagreed = 5,
        Return = 6,
        Closed = 7,
        Archived = 8,
    }
    aliases {
        "rejected" => WitnessDisagreed,
        "disagreed" => WitnessDisagreed,
        "returned" => Return,
    }
}

define_status_enum! {
    /// Root cause review status.
    RootCauseStatus {
        Pending = 1,
        Approved = 2,
        Rejected = 3,
    }
}

define_status_enum! {
    /// Corrective action (CAPA) status.
    ActionStatus {
        Open = 1,
        Reviewed = 2,
        Approved = 3,
        Rejected = 4,
        Returned = 5,
    }
    aliases {
        "return" => Returned,
    }
}

define_status_enum! {
    /// Evidence attachment review status.
    AttachmentStatus {
        Open = 1,
        Approved = 2,
        Rejected = 3,
        Inactive = 4,
    }
}

define_status_enum! {
    /// Audit plan status.
    AuditStatus {
        Planned = 1,
        InProgress = 2,
        Completed = 3,
        Cancelled = 4,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn finding_status_ids_match_seed_data() {
        assert_eq!(FindingStatus::Open.id(), 1);
        assert_eq!(FindingStatus::Received.id(), 2);
        assert_eq!(FindingStatus::PendingWitnessConfirmation.id(), 3);
        assert_eq!(FindingStatus::Confirmed.id(), 4);
        assert_eq!(FindingStatus::WitnessDisagreed.id(), 5);
        assert_eq!(FindingStatus::Return.id(), 6);
        assert_eq!(FindingStatus::Closed.id(), 7);
        assert_eq!(FindingStatus::Archived.id(), 8);
    }

    #[test]
    fn action_status_ids_match_seed_data() {
        assert_eq!(ActionStatus::Open.id(), 1);
        assert_eq!(ActionStatus::Reviewed.id(), 2);
        assert_eq!(ActionStatus::Approved.id(), 3);
        assert_eq!(ActionStatus::Rejected.id(), 4);
        assert_eq!(ActionStatus::Returned.id(), 5);
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = AttachmentStatus::Inactive.into();
        assert_eq!(id, 4);
    }

    #[test]
    fn from_id_round_trips_every_variant() {
        for status in RootCauseStatus::ALL {
            assert_eq!(RootCauseStatus::from_id(status.id()), Some(*status));
        }
        assert_eq!(AuditStatus::from_id(0), None);
        assert_eq!(AuditStatus::from_id(5), None);
    }

    #[test]
    fn parsing_ignores_case_and_separators() {
        assert_eq!(
            "pending_witness_confirmation".parse::<FindingStatus>().unwrap(),
            FindingStatus::PendingWitnessConfirmation
        );
        assert_eq!("APPROVED".parse::<RootCauseStatus>().unwrap(), RootCauseStatus::Approved);
        assert_eq!("in-progress".parse::<AuditStatus>().unwrap(), AuditStatus::InProgress);
    }

    #[test]
    fn legacy_spellings_resolve_through_aliases() {
        assert_eq!("Rejected".parse::<FindingStatus>().unwrap(), FindingStatus::WitnessDisagreed);
        assert_eq!("returned".parse::<FindingStatus>().unwrap(), FindingStatus::Return);
        assert_eq!("Return".parse::<ActionStatus>().unwrap(), ActionStatus::Returned);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = "Done".parse::<ActionStatus>().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("Open, Reviewed"));
    }

    #[test]
    fn unknown_id_from_database_is_internal() {
        assert_matches!(FindingStatus::try_from_id(42), Err(CoreError::Internal(_)));
    }

    #[test]
    fn serializes_as_canonical_name() {
        let json = serde_json::to_string(&FindingStatus::WitnessDisagreed).unwrap();
        assert_eq!(json, "\"WitnessDisagreed\"");
        assert_eq!(FindingStatus::Confirmed.to_string(), "Confirmed");
    }
}
