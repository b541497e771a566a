pub mod book;
pub mod category;
pub mod data_state;
pub mod stream;

pub use book::{Book, SaleLink};
pub use category::Category;
pub use data_state::DataState;
pub use stream::{Keyed, PageCursor, PageTicket, ResultStream};
