use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Schema is created on startup when absent
    run_migrations(&db).await?;

    Ok(db)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        email TEXT,
        hobbies TEXT,
        country TEXT,
        about TEXT,
        session_epoch INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        isbn TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        publication_date TEXT,
        publisher TEXT,
        image_url TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS to_read (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        isbn TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        FOREIGN KEY (account_id) REFERENCES accounts(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wishlist_books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        isbn TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        FOREIGN KEY (account_id) REFERENCES accounts(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS read_books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        isbn TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        rating INTEGER,
        review TEXT,
        FOREIGN KEY (isbn) REFERENCES books(isbn),
        FOREIGN KEY (account_id) REFERENCES accounts(id)
    )
    "#,
    // Third-party ratings dataset, independent of accounts
    r#"
    CREATE TABLE IF NOT EXISTS imported_users (
        user_id INTEGER PRIMARY KEY,
        location TEXT NOT NULL,
        age INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS imported_ratings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        rating INTEGER NOT NULL,
        book_isbn TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        FOREIGN KEY (book_isbn) REFERENCES books(isbn),
        FOREIGN KEY (user_id) REFERENCES imported_users(user_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_to_read_account ON to_read(account_id)",
    "CREATE INDEX IF NOT EXISTS idx_wishlist_account ON wishlist_books(account_id)",
    "CREATE INDEX IF NOT EXISTS idx_read_books_account ON read_books(account_id)",
    "CREATE INDEX IF NOT EXISTS idx_books_title ON books(title)",
    "CREATE INDEX IF NOT EXISTS idx_imported_ratings_isbn ON imported_ratings(book_isbn)",
];

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    for sql in SCHEMA {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    tracing::debug!("Schema ready ({} statements)", SCHEMA.len());
    Ok(())
}
