// Table definitions for the game objects, applied in order by DatabaseManager::migrate.
//
// game_levels.number is UNIQUE but DEFERRABLE: the relink pass may transiently
// duplicate a number while it bumps colliding levels, and the constraint is
// only checked at commit.

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS game_levels (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        number INTEGER NOT NULL CHECK (number >= 0),
        buyout INTEGER NOT NULL DEFAULT 0 CHECK (buyout >= 0),
        next_level_id INTEGER REFERENCES game_levels(id) ON DELETE SET NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT game_levels_number_key UNIQUE (number) DEFERRABLE INITIALLY DEFERRED
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS corporations (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        name VARCHAR(32) NOT NULL UNIQUE,
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS boxes (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        corporation_id INTEGER NOT NULL REFERENCES corporations(id) ON DELETE CASCADE,
        game_level_id INTEGER NOT NULL REFERENCES game_levels(id),
        name VARCHAR(32) NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        difficulty VARCHAR(16) NOT NULL DEFAULT '',
        operating_system VARCHAR(16) NOT NULL DEFAULT '?',
        autoformat BOOLEAN NOT NULL DEFAULT TRUE,
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS flags (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        box_id INTEGER NOT NULL REFERENCES boxes(id) ON DELETE CASCADE,
        name VARCHAR(64) NOT NULL,
        token TEXT NOT NULL,
        flag_type VARCHAR(16) NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        value INTEGER NOT NULL DEFAULT 0 CHECK (value >= 0),
        capture_message TEXT NOT NULL DEFAULT '',
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS hints (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        box_id INTEGER NOT NULL REFERENCES boxes(id) ON DELETE CASCADE,
        price INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),
        description TEXT NOT NULL DEFAULT '',
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ip_addresses (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        box_id INTEGER NOT NULL REFERENCES boxes(id) ON DELETE CASCADE,
        address VARCHAR(64) NOT NULL UNIQUE,
        visible BOOLEAN NOT NULL DEFAULT TRUE,
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS market_items (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        name VARCHAR(64) NOT NULL UNIQUE,
        price INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),
        description TEXT NOT NULL DEFAULT '',
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id SERIAL PRIMARY KEY,
        uuid UUID NOT NULL UNIQUE,
        name VARCHAR(24) NOT NULL UNIQUE,
        motto VARCHAR(32) NOT NULL DEFAULT '',
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];
