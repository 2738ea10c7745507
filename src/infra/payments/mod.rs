pub mod square_service;
