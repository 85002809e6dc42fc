pub mod load_worker;
