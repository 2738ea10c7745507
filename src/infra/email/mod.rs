pub mod resend_service;
