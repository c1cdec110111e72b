pub mod beijing;
