pub mod swap_market;
