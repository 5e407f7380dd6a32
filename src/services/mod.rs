pub mod label_service;
