mod clock_overrun;
mod mechanism_lifecycle;
mod plant_config;
mod policy_properties;
mod pump_interlock;
mod sensor_cov;
