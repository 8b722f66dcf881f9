pub mod activity;
pub mod event;
pub mod group;
pub mod node;
pub mod person;
pub mod photo;
pub mod poll;

pub use activity::*;
pub use event::*;
pub use group::*;
pub use node::*;
pub use person::*;
pub use photo::*;
pub use poll::*;
