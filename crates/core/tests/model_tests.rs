use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

use fatigue_risk_core::models::activity::ActivityLog;
use fatigue_risk_core::models::database::{Database, Session};
use fatigue_risk_core::models::prediction::{Prediction, PredictionInput, RiskLabel};
use fatigue_risk_core::models::report::PredictionListing;
use fatigue_risk_core::models::settings::{Settings, MAX_SESSION_TTL_HOURS};
use fatigue_risk_core::models::trend::{DateRange, LabelSeries, TrendPeriod, TrendQuery};
use fatigue_risk_core::models::user::{normalize_email, Role, User};
use fatigue_risk_core::errors::CoreError;
use fatigue_risk_core::storage::encryption::KdfParams;

fn input() -> PredictionInput {
    PredictionInput {
        age: 30,
        screen_time: 6.5,
        family_history: true,
    }
}

// ═══════════════════════════════════════════════════════════════════
//  RiskLabel
// ═══════════════════════════════════════════════════════════════════

mod risk_label {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(RiskLabel::Low.to_string(), "Low");
        assert_eq!(RiskLabel::Moderate.to_string(), "Moderate");
        assert_eq!(RiskLabel::High.to_string(), "High");
        assert_eq!(RiskLabel::VeryHigh.to_string(), "Very High");
    }

    #[test]
    fn model_class_table() {
        assert_eq!(RiskLabel::from_model_class(0), Some(RiskLabel::High));
        assert_eq!(RiskLabel::from_model_class(1), Some(RiskLabel::Low));
        assert_eq!(RiskLabel::from_model_class(2), Some(RiskLabel::Moderate));
        assert_eq!(RiskLabel::from_model_class(3), Some(RiskLabel::VeryHigh));
        assert_eq!(RiskLabel::from_model_class(4), None);
        assert_eq!(RiskLabel::from_model_class(255), None);
    }

    #[test]
    fn model_class_is_inverse() {
        for label in RiskLabel::ALL {
            assert_eq!(RiskLabel::from_model_class(label.model_class()), Some(label));
        }
    }

    #[test]
    fn index_matches_all_order() {
        for (i, label) in RiskLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
    }

    #[test]
    fn severity_ordering() {
        assert!(RiskLabel::Low < RiskLabel::Moderate);
        assert!(RiskLabel::Moderate < RiskLabel::High);
        assert!(RiskLabel::High < RiskLabel::VeryHigh);
    }

    #[test]
    fn parses_both_very_high_spellings() {
        assert_eq!("Very High".parse::<RiskLabel>().unwrap(), RiskLabel::VeryHigh);
        assert_eq!("VeryHigh".parse::<RiskLabel>().unwrap(), RiskLabel::VeryHigh);
        assert!("Extreme".parse::<RiskLabel>().is_err());
    }

    #[test]
    fn serializes_with_space() {
        assert_eq!(
            serde_json::to_string(&RiskLabel::VeryHigh).unwrap(),
            "\"Very High\""
        );
        let back: RiskLabel = serde_json::from_str("\"Very High\"").unwrap();
        assert_eq!(back, RiskLabel::VeryHigh);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Prediction
// ═══════════════════════════════════════════════════════════════════

mod prediction {
    use super::*;

    #[test]
    fn new_copies_features_and_class() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let p = Prediction::new(None, &input(), RiskLabel::Moderate, ts);
        assert_eq!(p.age, 30);
        assert_eq!(p.screen_time, 6.5);
        assert!(p.family_history);
        assert_eq!(p.risk_class, 2);
        assert_eq!(p.timestamp, ts);
    }

    #[test]
    fn ids_are_unique() {
        let ts = Utc::now();
        let a = Prediction::new(None, &input(), RiskLabel::Low, ts);
        let b = Prediction::new(None, &input(), RiskLabel::Low, ts);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn event_projection() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let p = Prediction::new(None, &input(), RiskLabel::High, ts);
        let e = p.event();
        assert_eq!(e.occurred_at, ts);
        assert_eq!(e.label, RiskLabel::High);
    }

    #[test]
    fn json_uses_api_field_names() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let p = Prediction::new(None, &input(), RiskLabel::VeryHigh, ts);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["predicted_label"], "Very High");
        assert_eq!(json["risk_numeric"], 3);
        assert_eq!(json["screen_time"], 6.5);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  User
// ═══════════════════════════════════════════════════════════════════

mod user {
    use super::*;

    #[test]
    fn new_normalizes_email() {
        let u = User::new("Ada", "  Ada@Example.COM ", Utc::now());
        assert_eq!(u.email, "ada@example.com");
        assert_eq!(u.role, Role::User);
        assert!(!u.is_deleted);
        assert!(u.password_hash.is_none());
    }

    #[test]
    fn normalize_email_helper() {
        assert_eq!(normalize_email(" X@Y.z"), "x@y.z");
    }

    #[test]
    fn signup_event_tracks_deletion() {
        let mut u = User::new("Ada", "ada@example.com", Utc::now());
        assert!(!u.signup_event().is_deleted);
        u.is_deleted = true;
        let e = u.signup_event();
        assert!(e.is_deleted);
        assert_eq!(e.occurred_at, u.created_at);
    }

    #[test]
    fn summary_hides_password_hash() {
        let mut u = User::new("Ada", "ada@example.com", Utc::now());
        u.password_hash = Some("$argon2id$secret".into());
        let json = serde_json::to_string(&u.summary()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::User.to_string(), "user");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Trend models
// ═══════════════════════════════════════════════════════════════════

mod trend {
    use super::*;

    #[test]
    fn period_parse_and_display() {
        for (s, p) in [
            ("daily", TrendPeriod::Daily),
            ("weekly", TrendPeriod::Weekly),
            ("monthly", TrendPeriod::Monthly),
        ] {
            assert_eq!(s.parse::<TrendPeriod>().unwrap(), p);
            assert_eq!(p.to_string(), s);
        }
        assert!(matches!(
            "Daily".parse::<TrendPeriod>(),
            Err(CoreError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn query_period_name_defaults_to_daily() {
        assert_eq!(TrendQuery::default().period_name(), "daily");
        assert_eq!(TrendQuery::period("weekly").period_name(), "weekly");
    }

    #[test]
    fn query_deserializes_with_missing_keys() {
        let q: TrendQuery = serde_json::from_str(r#"{"period":"monthly"}"#).unwrap();
        assert_eq!(q, TrendQuery::period("monthly"));
    }

    #[test]
    fn date_range_window() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap(),
        };
        assert_eq!(range.day_count(), 3);
        let window_end = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        assert_eq!(range.window_end(), Some(window_end));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap()));
        assert!(!range.contains(window_end));
    }

    #[test]
    fn reversed_range_has_no_buckets() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        assert_eq!(range.day_count(), 0);
    }

    #[test]
    fn last_representable_day_has_no_window_end() {
        let end = chrono::NaiveDate::MAX.and_time(chrono::NaiveTime::MIN).and_utc();
        let range = DateRange { start: end, end };
        assert_eq!(range.window_end(), None);
        assert!(range.contains(end));
    }

    #[test]
    fn label_series_accessors() {
        let mut s = LabelSeries::zeroed(2);
        s.get_mut(RiskLabel::High)[1] = 4;
        s.get_mut(RiskLabel::Low)[0] = 1;
        assert_eq!(s.bucket(0), Some([1, 0, 0, 0]));
        assert_eq!(s.bucket(1), Some([0, 0, 4, 0]));
        assert_eq!(s.bucket(2), None);
        assert_eq!(s.total(), 5);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Reports, settings, database
// ═══════════════════════════════════════════════════════════════════

mod containers {
    use super::*;

    #[test]
    fn listing_len_counts_all_labels() {
        let ts = Utc::now();
        let mut map = BTreeMap::new();
        map.insert(
            RiskLabel::Low,
            vec![Prediction::new(None, &input(), RiskLabel::Low, ts)],
        );
        map.insert(
            RiskLabel::High,
            vec![
                Prediction::new(None, &input(), RiskLabel::High, ts),
                Prediction::new(None, &input(), RiskLabel::High, ts),
            ],
        );
        let listing = PredictionListing {
            period: "daily".into(),
            prediction_counts: map,
        };
        assert_eq!(listing.len(), 3);
        assert!(!listing.is_empty());

        let json = serde_json::to_value(&listing).unwrap();
        assert!(json["prediction_counts"]["High"].is_array());
        assert!(json["prediction_counts"].get("Moderate").is_none());
    }

    #[test]
    fn default_settings() {
        let s = Settings::default();
        assert_eq!(s.session_ttl_hours, 24);
        assert_eq!(s.max_trend_days, 3650);
        assert_eq!(s.model_timeout_secs, 30);
        assert!(s.model_endpoint.is_none());
        assert_eq!(s.storage_kdf, KdfParams::default());
        assert_eq!(s.password_kdf, KdfParams::password_default());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn settings_from_partial_json() {
        let s = Settings::from_json(
            r#"{"session_ttl_hours": 2, "model_endpoint": "http://localhost:8000/predict"}"#,
        )
        .unwrap();
        assert_eq!(s.session_ttl_hours, 2);
        assert_eq!(s.model_endpoint.as_deref(), Some("http://localhost:8000/predict"));
        assert_eq!(s.max_trend_days, 3650);
    }

    #[test]
    fn settings_validation() {
        assert!(matches!(
            Settings::from_json(r#"{"session_ttl_hours": 0}"#),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{"session_ttl_hours": 10000000000}"#),
            Err(CoreError::ValidationError(_))
        ));
        assert!(Settings::from_json(&format!(
            r#"{{"session_ttl_hours": {MAX_SESSION_TTL_HOURS}}}"#
        ))
        .is_ok());
        assert!(matches!(
            Settings::from_json(r#"{"max_trend_days": -1}"#),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{"model_timeout_secs": 0}"#),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            Settings::from_json("not json"),
            Err(CoreError::Deserialization(_))
        ));
    }

    #[test]
    fn settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_trend_days": 90}"#).unwrap();
        let s = Settings::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(s.max_trend_days, 90);
    }

    #[test]
    fn settings_missing_file_is_io_error() {
        assert!(matches!(
            Settings::from_file("/definitely/not/here.json"),
            Err(CoreError::FileIO(_))
        ));
    }

    #[test]
    fn database_lookups() {
        let mut db = Database::default();
        let u = User::new("Ada", "ada@example.com", Utc::now());
        let id = u.id;
        db.users.push(u);
        assert!(db.user(id).is_some());
        assert!(db.user_by_email("ADA@example.com ").is_some());
        assert!(db.user_by_email("bob@example.com").is_none());
        db.user_mut(id).unwrap().is_deleted = true;
        assert!(db.user(id).unwrap().is_deleted);
    }

    #[test]
    fn session_expiry_is_inclusive_of_deadline() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let s = Session {
            token: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            role: Role::User,
            issued_at: issued,
            expires_at: issued + chrono::Duration::hours(1),
        };
        assert!(!s.is_expired(issued));
        assert!(s.is_expired(s.expires_at));
    }

    #[test]
    fn activity_log_new() {
        let ts = Utc::now();
        let log = ActivityLog::new(None, "opened dashboard", ts);
        assert_eq!(log.action, "opened dashboard");
        assert_eq!(log.timestamp, ts);
        assert!(log.user_id.is_none());
    }
}
