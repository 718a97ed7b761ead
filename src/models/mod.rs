pub mod account;
pub mod book;
pub mod imported_rating;
pub mod imported_user;
pub mod read_book;
pub mod to_read;
pub mod wishlist;

pub use account::Model as Account;
pub use book::Model as Book;
