pub mod checkout;
pub mod parse_return;
pub mod show_list;
