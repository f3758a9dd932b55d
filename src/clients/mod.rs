pub mod weatherbit;
