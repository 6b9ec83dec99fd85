// Services Module
// Job client, pollers, dispatcher and the controller tying them together

pub mod backend;
pub mod controller;
pub mod dispatcher;
pub mod poller;
