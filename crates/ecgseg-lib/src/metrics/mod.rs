pub mod rr;
