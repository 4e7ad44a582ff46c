pub mod altimeter;
pub mod anti_ice;
pub mod apu;
pub mod autoflight;
pub mod brakes;
pub mod electrical;
pub mod engine;
pub mod failures;
pub mod fire;
pub mod flight_controls;
pub mod fuel;
pub mod hydraulic;
pub mod landing_gear;
pub mod navigation;
pub mod overhead;
pub mod pneumatic;
pub mod pressurization;
pub mod shared;
pub mod simulation;
pub mod tcas;
pub mod warning;
