// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! Only connection setup, migrations and statements with no Diesel DSL
//! equivalent (PRAGMA, `last_insert_rowid()`) live here. Domain queries
//! and mutations live in `queries/` and `mutations/`.

pub mod sqlite;
