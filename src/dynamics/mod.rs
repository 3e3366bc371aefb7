pub mod contact_force;
pub mod integrator;
