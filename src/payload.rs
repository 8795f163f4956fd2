use serde::Deserialize;

/// The parts of a push notification that matter to us.
///
/// Push webhooks carry a lot more (commits, pusher, repository metadata),
/// all of which is ignored. Both fields are mandatory: a body missing either
/// is rejected before any repository operation happens.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PushEvent {
    /// The full name of the pushed reference (e.g. "refs/heads/main").
    #[serde(rename = "ref")]
    pub reference: String,
    /// The commit id the reference points to after the push.
    pub after: String,
}
