/// Schema for the jobs database.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY NOT NULL,
    posting_time INTEGER NOT NULL,
    company TEXT NOT NULL,
    position TEXT NOT NULL,
    -- JSON array of tag strings
    tags TEXT NOT NULL,
    logo TEXT,
    description TEXT NOT NULL,
    url TEXT NOT NULL,
    -- Additional info, fetched on demand; all NULL until then
    job_desc TEXT,
    apply_instruction TEXT,
    apply_url TEXT,
    is_bookmarked INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_jobs_bookmarked ON jobs(is_bookmarked);

-- Key-value store for user selections
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY NOT NULL,
    value INTEGER NOT NULL
);
"#;
