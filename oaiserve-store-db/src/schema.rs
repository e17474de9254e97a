// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Database schema definitions for the record store.

/// Records, sets and the record -> set membership relation.
///
/// `modified` is a unix timestamp in seconds. `data` holds the JSON encoded
/// metadata body.
pub const SCHEMA_SQL: &str = r#"
create table if not exists records (
    record_id text primary key not null,
    modified  integer not null,
    deleted   integer not null default 0,
    data      text not null
);

create index if not exists IndexRecordsModified on records(modified, record_id);

create table if not exists sets (
    set_id      text primary key not null,
    name        text not null,
    description text,
    hidden      integer not null default 0
);

create table if not exists setrefs (
    record_id text not null,
    set_id    text not null,
    primary key (record_id, set_id),
    foreign key (record_id) references records(record_id) on delete cascade,
    foreign key (set_id) references sets(set_id) on delete cascade
);

create index if not exists IndexSetrefsSet on setrefs(set_id);
"#;

/// Schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;
