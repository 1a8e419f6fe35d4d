pub mod pagination {

    pub const DEFAULT_PAGE: u64 = 1;

    pub const DEFAULT_LIMIT: u64 = 10;

    pub const MAX_LIMIT: u64 = 100;

    /// Keeps the row offset `(page - 1) * limit` inside SQLite's signed 64-bit range.
    pub const MAX_PAGE: u64 = i64::MAX.unsigned_abs() / MAX_LIMIT;
}

pub mod products {

    pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

    pub const MIN_SEARCH_LENGTH: usize = 2;
}

pub mod compatibility {

    /// Primary key of the single version counter row.
    pub const VERSION_ROW_ID: i32 = 1;

    pub const INITIAL_VERSION: i64 = 1;

    /// Row label in the matrix view; metal columns share its key space.
    pub const MATRIX_ROW_KEY: &str = "chemicalName";
}

pub mod tokens {

    pub const ACCESS_PURPOSE: &str = "access";

    pub const RESET_PURPOSE: &str = "password-reset";
}
