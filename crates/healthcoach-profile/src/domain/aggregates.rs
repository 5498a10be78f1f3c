//! Aggregate roots for the Profile context.

use chrono::{DateTime, NaiveDate, Utc};
use healthcoach_core::aggregate::{AggregateRoot, EventOutbox};
use healthcoach_core::clock::Clock;
use uuid::Uuid;

use crate::domain::events::{ProfileCreated, ProfileEvent, ProfileEventKind};

/// Profile of a user who is coached.
#[derive(Debug, Clone)]
pub struct Trainee {
    /// The owning user.
    pub user_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth, if given.
    pub birth_date: Option<NaiveDate>,
    outbox: EventOutbox,
}

/// Profile of a user who coaches groups.
#[derive(Debug, Clone)]
pub struct Coach {
    /// The owning user.
    pub user_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth, if given.
    pub birth_date: Option<NaiveDate>,
    /// Years of coaching experience.
    pub years_experience: i32,
    /// Free-form biography.
    pub bio: String,
    outbox: EventOutbox,
}

impl Trainee {
    /// Rebuilds a trainee from storage without raising events.
    #[must_use]
    pub fn restore(
        user_id: Uuid,
        first_name: String,
        last_name: String,
        birth_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            user_id,
            first_name,
            last_name,
            birth_date,
            outbox: EventOutbox::new(),
        }
    }
}

impl Coach {
    /// Rebuilds a coach from storage without raising events.
    #[must_use]
    pub fn restore(
        user_id: Uuid,
        first_name: String,
        last_name: String,
        birth_date: Option<NaiveDate>,
        years_experience: i32,
        bio: String,
    ) -> Self {
        Self {
            user_id,
            first_name,
            last_name,
            birth_date,
            years_experience,
            bio,
            outbox: EventOutbox::new(),
        }
    }
}

/// A user's profile: exactly one of the two kinds.
#[derive(Debug, Clone)]
pub enum Profile {
    /// Trainee profile.
    Trainee(Trainee),
    /// Coach profile.
    Coach(Coach),
}

impl Profile {
    /// Creates a trainee profile and raises `profile.created`.
    #[must_use]
    pub fn new_trainee(
        user_id: Uuid,
        first_name: String,
        last_name: String,
        birth_date: Option<NaiveDate>,
        clock: &dyn Clock,
    ) -> Self {
        let profile = Self::Trainee(Trainee::restore(user_id, first_name, last_name, birth_date));
        profile.raise_created(clock.now());
        profile
    }

    /// Creates a coach profile and raises `profile.created`.
    #[must_use]
    pub fn new_coach(
        user_id: Uuid,
        first_name: String,
        last_name: String,
        birth_date: Option<NaiveDate>,
        years_experience: i32,
        bio: String,
        clock: &dyn Clock,
    ) -> Self {
        let profile = Self::Coach(Coach::restore(
            user_id,
            first_name,
            last_name,
            birth_date,
            years_experience,
            bio,
        ));
        profile.raise_created(clock.now());
        profile
    }

    /// The owning user.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::Trainee(t) => t.user_id,
            Self::Coach(c) => c.user_id,
        }
    }

    /// `"trainee"` or `"coach"`.
    #[must_use]
    pub fn profile_type(&self) -> &'static str {
        match self {
            Self::Trainee(_) => "trainee",
            Self::Coach(_) => "coach",
        }
    }

    /// Given name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        match self {
            Self::Trainee(t) => &t.first_name,
            Self::Coach(c) => &c.first_name,
        }
    }

    /// Family name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        match self {
            Self::Trainee(t) => &t.last_name,
            Self::Coach(c) => &c.last_name,
        }
    }

    fn raise_created(&self, occurred_at: DateTime<Utc>) {
        self.push_event(ProfileEvent {
            user_id: self.user_id(),
            occurred_at,
            kind: ProfileEventKind::ProfileCreated(ProfileCreated {
                profile_type: self.profile_type().to_owned(),
                first_name: self.first_name().to_owned(),
                last_name: self.last_name().to_owned(),
            }),
        });
    }
}

impl AggregateRoot for Profile {
    fn aggregate_id(&self) -> String {
        self.user_id().to_string()
    }

    fn outbox(&self) -> &EventOutbox {
        match self {
            Self::Trainee(t) => &t.outbox,
            Self::Coach(c) => &c.outbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use healthcoach_core::event::DomainEvent;
    use healthcoach_test_support::FixedClock;

    use super::*;
    use crate::domain::events::PROFILE_CREATED;

    #[test]
    fn test_new_coach_raises_created_with_type() {
        // Arrange
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let user_id = Uuid::new_v4();

        // Act
        let profile = Profile::new_coach(
            user_id,
            "Ada".into(),
            "Lovelace".into(),
            None,
            7,
            "Strength coach".into(),
            &clock,
        );

        // Assert
        assert_eq!(profile.profile_type(), "coach");
        let events = profile.pop_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), PROFILE_CREATED);
        let event = events[0].downcast_ref::<ProfileEvent>().unwrap();
        assert_eq!(event.user_id, user_id);
        match &event.kind {
            ProfileEventKind::ProfileCreated(payload) => {
                assert_eq!(payload.profile_type, "coach");
            }
        }
    }

    #[test]
    fn test_restored_trainee_has_no_pending_events() {
        let profile = Profile::Trainee(Trainee::restore(
            Uuid::new_v4(),
            "Grace".into(),
            "Hopper".into(),
            NaiveDate::from_ymd_opt(1990, 12, 9),
        ));

        assert!(profile.pop_events().is_empty());
        assert_eq!(profile.profile_type(), "trainee");
    }
}
