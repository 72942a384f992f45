pub mod edit;
pub mod external;
pub mod import;
pub mod list;
pub mod show;
