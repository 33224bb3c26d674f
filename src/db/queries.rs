pub const CREATE_INCIDENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ncdot_incidents (
    id BIGINT PRIMARY KEY,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    common_name TEXT NOT NULL,
    reason TEXT NOT NULL,
    "condition" TEXT NOT NULL,
    incident_type TEXT NOT NULL,
    severity INTEGER NOT NULL,
    direction TEXT NOT NULL,
    location TEXT NOT NULL,
    county_id INTEGER NOT NULL,
    county_name TEXT NOT NULL,
    city TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    last_update TEXT NOT NULL,
    road TEXT NOT NULL,
    route_id INTEGER NOT NULL,
    lanes_closed INTEGER NOT NULL,
    lanes_total INTEGER NOT NULL,
    detour TEXT NOT NULL,
    cross_street_prefix TEXT NOT NULL,
    cross_street_number INTEGER NOT NULL,
    cross_street_suffix TEXT NOT NULL,
    cross_street_common_name TEXT NOT NULL,
    event TEXT NOT NULL,
    created_from_concurrent BOOLEAN NOT NULL,
    movable_construction TEXT NOT NULL,
    work_zone_speed_limit INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    cleared_time TIMESTAMPTZ,
    CONSTRAINT ncdot_incidents_status_cleared CHECK (
        (status = 'active' AND cleared_time IS NULL)
        OR (status = 'cleared' AND cleared_time IS NOT NULL)
    )
);
"#;

pub const CREATE_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS ncdot_incidents_status_type_idx
ON ncdot_incidents (status, incident_type);
"#;

pub const UPSERT_INCIDENT: &str = r#"
INSERT INTO ncdot_incidents (
    id, latitude, longitude, common_name, reason, "condition", incident_type,
    severity, direction, location, county_id, county_name, city, start_time,
    end_time, last_update, road, route_id, lanes_closed, lanes_total, detour,
    cross_street_prefix, cross_street_number, cross_street_suffix,
    cross_street_common_name, event, created_from_concurrent, movable_construction,
    work_zone_speed_limit, status, cleared_time
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
    $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, NULL
)
ON CONFLICT (id) DO UPDATE
SET latitude = EXCLUDED.latitude,
    longitude = EXCLUDED.longitude,
    reason = EXCLUDED.reason,
    "condition" = EXCLUDED."condition",
    incident_type = EXCLUDED.incident_type,
    severity = EXCLUDED.severity,
    end_time = EXCLUDED.end_time,
    last_update = EXCLUDED.last_update,
    lanes_closed = EXCLUDED.lanes_closed,
    detour = EXCLUDED.detour,
    status = EXCLUDED.status,
    cleared_time = NULL;
"#;

pub const SELECT_ACTIVE_BY_TYPE: &str = r#"
SELECT id, road, location, city FROM ncdot_incidents WHERE status = $1 AND incident_type = $2;
"#;

pub const MARK_CLEARED: &str = r#"
UPDATE ncdot_incidents
SET status = $2,
    cleared_time = NOW()
WHERE id = $1;
"#;
