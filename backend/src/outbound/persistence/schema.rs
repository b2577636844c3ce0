//! Diesel table definitions for the PostgreSQL schema.
//!
//! Keep in step with `backend/migrations`; `diesel print-schema` regenerates
//! these from a live database.

diesel::table! {
    /// Guards as known to scheduling. Read only.
    guards (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        display_name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shift assignments. Read only.
    shifts (id) {
        id -> Uuid,
        guard_id -> Uuid,
        post_id -> Uuid,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        /// `scheduled`, `in_progress`, `completed` or `cancelled`.
        status -> Varchar,
    }
}

diesel::table! {
    /// Circular authorized areas per post. Read only.
    geofences (id) {
        id -> Uuid,
        post_id -> Uuid,
        tenant_id -> Uuid,
        name -> Varchar,
        center_lat -> Float8,
        center_lng -> Float8,
        radius_meters -> Float8,
        /// Subset of `entry`, `exit`.
        alert_types -> Array<Text>,
        /// Serialized `ActiveSchedule`.
        active_schedule -> Jsonb,
        is_active -> Bool,
    }
}

diesel::table! {
    /// Append-only GPS fixes.
    location_reports (id) {
        id -> Uuid,
        guard_id -> Uuid,
        latitude -> Float8,
        longitude -> Float8,
        speed -> Nullable<Float8>,
        direction -> Nullable<Float8>,
        captured_at -> Timestamptz,
        received_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (guard, shift); unique on that pair.
    attendance (id) {
        id -> Uuid,
        guard_id -> Uuid,
        shift_id -> Uuid,
        check_in_time -> Nullable<Timestamptz>,
        check_in_lat -> Nullable<Float8>,
        check_in_lng -> Nullable<Float8>,
        check_out_time -> Nullable<Timestamptz>,
        check_out_lat -> Nullable<Float8>,
        check_out_lng -> Nullable<Float8>,
        status -> Varchar,
    }
}

diesel::table! {
    alerts (id) {
        id -> Uuid,
        /// Alert category, e.g. `geofence_breach`.
        #[sql_name = "type"]
        alert_type -> Varchar,
        severity -> Varchar,
        guard_id -> Uuid,
        geofence_id -> Nullable<Uuid>,
        location_id -> Nullable<Uuid>,
        message -> Text,
        status -> Varchar,
        created_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
        /// Set on the alert that opened a breach episode.
        opens_episode -> Bool,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    guards,
    shifts,
    geofences,
    location_reports,
    attendance,
    alerts,
);
