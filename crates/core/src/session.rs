//! Vibe session record and its lifecycle state machine.
//!
//! ```text
//! open ──join──▶ matched ──both arrived──▶ completed
//!   │               │ └──expired + no-show──▶ reported
//!   └──abort──▶ aborted ◀──abort──┘
//! ```
//!
//! Every transition here is a pure function over `&mut Session`. The engine
//! applies them to a freshly read copy and commits with a version-checked
//! write, so a precondition is always evaluated against the state that is
//! actually replaced.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::Coordinates;
use crate::types::{SessionId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Matched,
    Completed,
    Reported,
    Aborted,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Matched => "matched",
            Self::Completed => "completed",
            Self::Reported => "reported",
            Self::Aborted => "aborted",
        }
    }

    /// Terminal statuses are one-way.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Reported | Self::Aborted)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "matched" => Ok(Self::Matched),
            "completed" => Ok(Self::Completed),
            "reported" => Ok(Self::Reported),
            "aborted" => Ok(Self::Aborted),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub creator_id: UserId,
    pub creator_name: String,
    pub coords: Coordinates,
    /// Discovery bucket (geohash at search precision).
    pub bucket: String,
    pub text: String,
    pub location_name: String,
    pub activity_type: String,
    pub duration_mins: i64,
    pub secure_key: String,
    pub creator_trust_score: i64,
}

/// One proposed meetup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub creator_id: UserId,
    pub creator_name: String,
    /// The single joined peer, if any. Capacity is one by construction.
    pub participant_id: Option<UserId>,
    pub participant_name: Option<String>,
    pub coords: Coordinates,
    pub bucket: String,
    pub text: String,
    pub location_name: String,
    pub activity_type: String,
    pub status: SessionStatus,
    pub duration_mins: i64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub session_started: bool,
    pub started_at: Option<Timestamp>,
    pub active_participants: BTreeSet<UserId>,
    /// Arrival flag per party: the creator from creation, the peer from join.
    pub arrivals: BTreeMap<UserId, bool>,
    pub secure_key: String,
    /// Creator reputation captured at creation, used for feed visibility.
    pub creator_trust_score: i64,
    pub aborted_by: Option<UserId>,
    pub resolved_at: Option<Timestamp>,
    /// Bumped by the store on every committed write.
    pub version: i64,
}

/// Result of a join attempt that passed every precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The caller took the open slot.
    Joined,
    /// The caller was already the participant; nothing changed.
    AlreadyJoined,
}

/// Result of a presence toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceOutcome {
    /// The active set changed.
    pub changed: bool,
    /// This update performed the one-time handshake.
    pub handshake: bool,
}

/// Result of a leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Other viewers remain, or the session is still live.
    Left,
    /// The session is terminal and nobody is left viewing it.
    Reclaim,
}

/// Result of an arrival confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// Flag set; `completed` is true when the counterparty had already arrived.
    Logged { completed: bool },
    /// The caller had already confirmed; nothing changed.
    AlreadyLogged,
}

impl Session {
    /// Build a new `open` session expiring `duration_mins` after `now`.
    pub fn open(id: SessionId, input: NewSession, now: Timestamp) -> Self {
        let mut arrivals = BTreeMap::new();
        arrivals.insert(input.creator_id, false);

        Self {
            id,
            creator_id: input.creator_id,
            creator_name: input.creator_name,
            participant_id: None,
            participant_name: None,
            coords: input.coords,
            bucket: input.bucket,
            text: input.text,
            location_name: input.location_name,
            activity_type: input.activity_type,
            status: SessionStatus::Open,
            duration_mins: input.duration_mins,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(input.duration_mins),
            session_started: false,
            started_at: None,
            active_participants: BTreeSet::new(),
            arrivals,
            secure_key: input.secure_key,
            creator_trust_score: input.creator_trust_score,
            aborted_by: None,
            resolved_at: None,
            version: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn participant_count(&self) -> usize {
        usize::from(self.participant_id.is_some())
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Creator or joined participant.
    pub fn is_party(&self, user_id: UserId) -> bool {
        self.creator_id == user_id || self.participant_id == Some(user_id)
    }

    /// The other party, if there is one.
    pub fn counterparty(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.creator_id {
            self.participant_id
        } else if self.participant_id == Some(user_id) {
            Some(self.creator_id)
        } else {
            None
        }
    }

    pub fn has_arrived(&self, user_id: UserId) -> bool {
        self.arrivals.get(&user_id).copied().unwrap_or(false)
    }

    /// Visible to strangers in open discovery.
    pub fn is_discoverable(&self, now: Timestamp) -> bool {
        self.status == SessionStatus::Open && self.participant_id.is_none() && !self.is_expired(now)
    }

    /// Whole minutes left before expiry, never negative.
    pub fn remaining_mins(&self, now: Timestamp) -> i64 {
        (self.expires_at - now).num_minutes().max(0)
    }

    /// Copy suitable for someone who is not a party: the handshake code is
    /// withheld.
    pub fn redacted(&self) -> Session {
        Session {
            secure_key: String::new(),
            ..self.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Take the open slot.
    ///
    /// Checked in order: self-join, distance, idempotent re-entry, expiry,
    /// capacity.
    pub fn join(
        &mut self,
        joiner_id: UserId,
        joiner_name: &str,
        joiner_coords: &Coordinates,
        radius_km: f64,
        now: Timestamp,
    ) -> Result<JoinOutcome, CoreError> {
        if joiner_id == self.creator_id {
            return Err(CoreError::SelfJoinForbidden);
        }

        let distance_km = joiner_coords.distance_km(&self.coords);
        if distance_km > radius_km {
            return Err(CoreError::TooFar {
                distance_km,
                limit_km: radius_km,
            });
        }

        if self.participant_id == Some(joiner_id) {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        if self.status == SessionStatus::Open && self.is_expired(now) {
            return Err(CoreError::NotFound);
        }

        if self.status != SessionStatus::Open || self.participant_count() >= 1 {
            return Err(CoreError::AlreadyFull);
        }

        self.participant_id = Some(joiner_id);
        self.participant_name = Some(joiner_name.to_string());
        self.arrivals.insert(joiner_id, false);
        self.status = SessionStatus::Matched;
        Ok(JoinOutcome::Joined)
    }

    /// Add or remove a party from the active set, starting the countdown the
    /// first time both parties are present together.
    ///
    /// The handshake fires once: `session_started` never reverts, and later
    /// toggles leave `expires_at` alone.
    pub fn set_presence(
        &mut self,
        user_id: UserId,
        present: bool,
        now: Timestamp,
    ) -> Result<PresenceOutcome, CoreError> {
        if !self.is_party(user_id) {
            return Err(CoreError::NotParticipant);
        }

        let changed = if present {
            self.active_participants.insert(user_id)
        } else {
            self.active_participants.remove(&user_id)
        };

        let mut outcome = PresenceOutcome {
            changed,
            handshake: false,
        };

        if !self.session_started && self.status == SessionStatus::Matched && self.both_present() {
            self.session_started = true;
            self.started_at = Some(now);
            self.expires_at = now + chrono::Duration::minutes(self.duration_mins);
            outcome.handshake = true;
        }

        Ok(outcome)
    }

    fn both_present(&self) -> bool {
        match self.participant_id {
            Some(peer) => {
                self.active_participants.contains(&self.creator_id)
                    && self.active_participants.contains(&peer)
            }
            None => false,
        }
    }

    /// Stop viewing the session.
    pub fn leave(&mut self, user_id: UserId) -> Result<LeaveOutcome, CoreError> {
        if !self.is_party(user_id) {
            return Err(CoreError::NotParticipant);
        }
        self.active_participants.remove(&user_id);

        if self.status.is_terminal() && self.active_participants.is_empty() {
            Ok(LeaveOutcome::Reclaim)
        } else {
            Ok(LeaveOutcome::Left)
        }
    }

    /// Confirm physical arrival for `user_id`.
    pub fn log_arrival(&mut self, user_id: UserId, now: Timestamp) -> Result<ArrivalOutcome, CoreError> {
        if !self.is_party(user_id) {
            return Err(CoreError::NotParticipant);
        }
        if self.has_arrived(user_id) {
            return Ok(ArrivalOutcome::AlreadyLogged);
        }
        match self.status {
            SessionStatus::Matched => {}
            SessionStatus::Open => {
                return Err(CoreError::InvalidState("nobody has joined this vibe yet".into()))
            }
            terminal => {
                return Err(CoreError::InvalidState(format!("session is already {terminal}")))
            }
        }

        self.arrivals.insert(user_id, true);

        let completed = self
            .counterparty(user_id)
            .is_some_and(|peer| self.has_arrived(peer));
        if completed {
            self.status = SessionStatus::Completed;
            self.resolved_at = Some(now);
        }

        Ok(ArrivalOutcome::Logged { completed })
    }

    /// Flag `accused_id` as a no-show.
    ///
    /// Allowed only once the session has expired, the accuser has arrived
    /// and the accused has not. A second report finds a terminal status and
    /// is rejected, so the penalty cannot be applied twice.
    pub fn report_ghosting(
        &mut self,
        accuser_id: UserId,
        accused_id: UserId,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        if !self.is_party(accuser_id) {
            return Err(CoreError::NotParticipant);
        }
        if self.status.is_terminal() {
            return Err(CoreError::InvalidState(format!("session is already {}", self.status)));
        }
        if self.status != SessionStatus::Matched {
            return Err(CoreError::InvalidState("nobody has joined this vibe yet".into()));
        }
        if self.counterparty(accuser_id) != Some(accused_id) {
            return Err(CoreError::GhostReportNotAllowed(
                "the accused is not your counterparty".into(),
            ));
        }
        if !self.is_expired(now) {
            return Err(CoreError::GhostReportNotAllowed(
                "the session has not expired yet".into(),
            ));
        }
        if !self.has_arrived(accuser_id) {
            return Err(CoreError::GhostReportNotAllowed(
                "you must confirm your own arrival first".into(),
            ));
        }
        if self.has_arrived(accused_id) {
            return Err(CoreError::GhostReportNotAllowed(
                "the accused has confirmed arrival".into(),
            ));
        }

        self.status = SessionStatus::Reported;
        self.resolved_at = Some(now);
        Ok(())
    }

    /// Unilaterally end a live session.
    pub fn abort(&mut self, user_id: UserId, now: Timestamp) -> Result<(), CoreError> {
        if !self.is_party(user_id) {
            return Err(CoreError::NotParticipant);
        }
        if self.status.is_terminal() {
            return Err(CoreError::InvalidState(format!("session is already {}", self.status)));
        }

        self.status = SessionStatus::Aborted;
        self.aborted_by = Some(user_id);
        self.resolved_at = Some(now);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
