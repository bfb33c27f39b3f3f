//! SQL schema for the forum SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS principals (
    principal_id  TEXT PRIMARY KEY,
    external_id   TEXT NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    avatar        TEXT,
    rank          INTEGER NOT NULL DEFAULT 1,   -- 0 | 1 | 9
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS communities (
    community_id  TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    approved      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Absence of a row means rank 0 in that community.
CREATE TABLE IF NOT EXISTS memberships (
    community_id  TEXT NOT NULL REFERENCES communities(community_id) ON DELETE CASCADE,
    principal_id  TEXT NOT NULL REFERENCES principals(principal_id)  ON DELETE CASCADE,
    rank          INTEGER NOT NULL,             -- 1 | 9 | 10
    PRIMARY KEY (community_id, principal_id)
);

CREATE TABLE IF NOT EXISTS posts (
    post_id       TEXT PRIMARY KEY,
    community_id  TEXT NOT NULL REFERENCES communities(community_id) ON DELETE CASCADE,
    author_id     TEXT NOT NULL REFERENCES principals(principal_id),
    title         TEXT NOT NULL,
    body          TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    edited_at     TEXT
);

-- No cascade on parent_id: comments are only removed as leaves, or all at
-- once with their post.
CREATE TABLE IF NOT EXISTS comments (
    comment_id       TEXT PRIMARY KEY,
    post_id          TEXT NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    parent_id        TEXT REFERENCES comments(comment_id),
    author_id        TEXT NOT NULL REFERENCES principals(principal_id),
    body             TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    edited_at        TEXT,
    has_descendants  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS follows (
    followee_id   TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    follower_id   TEXT NOT NULL REFERENCES principals(principal_id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    PRIMARY KEY (followee_id, follower_id)
);

CREATE INDEX IF NOT EXISTS principals_rank_idx ON principals(rank);
CREATE INDEX IF NOT EXISTS posts_community_idx ON posts(community_id, created_at);
CREATE INDEX IF NOT EXISTS comments_post_idx   ON comments(post_id, created_at);
CREATE INDEX IF NOT EXISTS comments_parent_idx ON comments(parent_id);
CREATE INDEX IF NOT EXISTS posts_author_idx    ON posts(author_id, created_at);
CREATE INDEX IF NOT EXISTS follows_follower_idx ON follows(follower_id);

PRAGMA user_version = 1;
";
