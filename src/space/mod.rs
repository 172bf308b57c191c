pub mod periodic_box;
