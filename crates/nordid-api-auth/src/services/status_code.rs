//! Status code resolution.
//!
//! Maps a collect snapshot plus context onto one stable RFA message key.
//! The rules form an explicit ordered list evaluated top to bottom,
//! first match wins. Several predicates overlap on purpose (a pending
//! QR poll also matches the generic pending rules); the ordering IS the
//! tie-break policy and must not be reordered.

use nordid_rp::{CollectResponse, CollectStatus, ErrorCode, Operation, ProgressStatus};

/// Namespace prefix for every resolved message key.
pub const MESSAGE_PREFIX: &str = "bankid.msg.";

/// Context for one resolution.
#[derive(Debug, Clone, Copy)]
struct StatusData<'a> {
    collect: &'a CollectResponse,
    show_qr: bool,
    operation: Operation,
}

impl StatusData<'_> {
    fn pending(&self) -> bool {
        self.collect.status == CollectStatus::Pending
    }

    fn failed(&self) -> bool {
        self.collect.status == CollectStatus::Failed
    }

    fn hint(&self, hint: ProgressStatus) -> bool {
        self.pending() && self.collect.progress_status == Some(hint)
    }

    fn no_hint(&self) -> bool {
        self.collect.progress_status.is_none()
    }

    fn error(&self, code: ErrorCode) -> bool {
        self.failed() && self.collect.error_code == Some(code)
    }
}

struct StatusRule {
    code: &'static str,
    applies: fn(&StatusData<'_>) -> bool,
}

/// The ordered rule table. Earlier rules win.
const RULES: &[StatusRule] = &[
    // The QR flow overrides everything else while the order is pending:
    // the user is on another device, so device-local guidance is wrong.
    StatusRule {
        code: "rfa9",
        applies: |s| s.show_qr && s.hint(ProgressStatus::UserSign),
    },
    StatusRule {
        code: "ext2",
        applies: |s| s.show_qr && s.pending(),
    },
    StatusRule {
        code: "rfa1",
        applies: |s| s.hint(ProgressStatus::NoClient),
    },
    StatusRule {
        code: "rfa3",
        applies: |s| s.error(ErrorCode::Cancelled),
    },
    StatusRule {
        code: "rfa4",
        applies: |s| s.error(ErrorCode::AlreadyInProgress),
    },
    StatusRule {
        code: "rfa5",
        applies: |s| {
            s.error(ErrorCode::RequestTimeout)
                || s.error(ErrorCode::Maintenance)
                || s.error(ErrorCode::InternalError)
        },
    },
    StatusRule {
        code: "rfa6",
        applies: |s| s.error(ErrorCode::UserCancel),
    },
    StatusRule {
        code: "rfa8",
        applies: |s| s.error(ErrorCode::ExpiredTransaction),
    },
    StatusRule {
        code: "rfa9-auth",
        applies: |s| s.hint(ProgressStatus::UserSign) && s.operation == Operation::Auth,
    },
    StatusRule {
        code: "rfa9-sign",
        applies: |s| s.hint(ProgressStatus::UserSign) && s.operation == Operation::Sign,
    },
    StatusRule {
        code: "rfa13",
        applies: |s| s.hint(ProgressStatus::OutstandingTransaction),
    },
    StatusRule {
        code: "rfa21-auth",
        applies: |s| s.pending() && s.operation == Operation::Auth && s.no_hint(),
    },
    StatusRule {
        code: "rfa21-sign",
        applies: |s| s.pending() && s.operation == Operation::Sign && s.no_hint(),
    },
    StatusRule {
        code: "rfa22",
        applies: |s| s.failed(),
    },
    StatusRule {
        code: "rfa23",
        applies: |s| s.hint(ProgressStatus::UserMrtd),
    },
];

/// Resolves a collect snapshot to its message key.
///
/// Pure: identical input always yields the identical key. The key is a
/// lookup handle for user-facing text; no text is rendered here.
#[must_use]
pub fn resolve(collect: &CollectResponse, show_qr: bool, operation: Operation) -> String {
    let data = StatusData {
        collect,
        show_qr,
        operation,
    };
    let code = RULES
        .iter()
        .find(|rule| (rule.applies)(&data))
        .map_or("blank", |rule| rule.code);
    format!("{MESSAGE_PREFIX}{code}")
}
