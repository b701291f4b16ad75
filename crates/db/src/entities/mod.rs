//! `SeaORM` entity definitions.

pub mod settlements;
