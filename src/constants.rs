//! Centralised field, physics and interaction constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place.  [`crate::config::SpacetimeConfig::default()`] mirrors
//! every value below; `assets/spacetime.toml` can override any subset at startup.
//!
//! ## Tuning guidance
//!
//! The grid shader uniforms and the CPU-side entity placement both read the
//! field constants, so changing `GRAVITY_K` or `EPSILON` moves the surface and
//! the entities together.

// ── Field ────────────────────────────────────────────────────────────────────

/// Strength constant shared by the force law and the potential.
///
/// Higher values → deeper wells and stronger attraction.
/// At 5.0 a 200-mass source dips the grid by 50 u directly underneath it.
pub const GRAVITY_K: f32 = 5.0;

/// Softening length added in quadrature to every distance.
///
/// Prevents the singularity at zero separation and flattens the bottom of
/// each well.  Larger values → broader, shallower wells.
pub const EPSILON: f32 = 20.0;

/// Number of mass slots in the packed grid uniform arrays.
///
/// `max_mass_count` may never exceed this.
pub const MAX_MASS_SLOTS: usize = 5;

/// XZ position written into unused uniform slots.  Paired with a zero mass it
/// contributes exactly nothing to the potential.
pub const SENTINEL_POSITION: f32 = 9999.0;

// ── Grid ─────────────────────────────────────────────────────────────────────

/// Side length of the square deformable grid (world units).
pub const PLANE_SIZE: f32 = 1000.0;

/// Number of cells per side of the rendered grid.
pub const GRID_DIVISIONS: u32 = 40;

/// Line segments per grid line.  More segments → smoother wells.
pub const GRID_LINE_SEGMENTS: u32 = 120;

// ── Mass Registry / Spawning ─────────────────────────────────────────────────

/// Maximum number of masses alive at once.
pub const MAX_MASS_COUNT: usize = 5;

/// Smallest mass a charge can produce (released immediately).
pub const MIN_MASS_VALUE: f32 = 10.0;

/// Largest mass a charge can produce (saturated hold).
pub const MAX_MASS_VALUE: f32 = 200.0;

/// Mass gained per second of charge.
///
/// At 50.0 the default range saturates after 3.8 s.
pub const CHARGE_RATE: f32 = 50.0;

/// Visual scale of a zero-mass sphere; scale grows by `mass / SCALE_PER_MASS`.
pub const BASE_MASS_SCALE: f32 = 2.0;

/// Mass per unit of visual scale.
pub const SCALE_PER_MASS: f32 = 10.0;

/// Upper bound on the visual scale of a mass sphere.
pub const MAX_MASS_SCALE: f32 = 30.0;

/// Speed range (u/s) of the tangential kick given to masses spawned into a
/// non-empty registry.
pub const SPAWN_ORBIT_SPEED_MIN: f32 = 15.0;
pub const SPAWN_ORBIT_SPEED_MAX: f32 = 35.0;

/// Half-extent of the invisible placement plane (y = 0) that charges are
/// started on.  Wider than the map so clicks near the rim still register.
pub const PLACEMENT_HALF_EXTENT: f32 = 1500.0;

/// When true, the first mass created after a reset is pinned in place.
pub const ANCHOR_FIRST_MASS: bool = false;

/// When true, a mass's own well contributes to its elevation
/// (constant `-K·m/ε` offset).
pub const INCLUDE_SELF_POTENTIAL: bool = false;

// ── Mass Simulation ──────────────────────────────────────────────────────────

/// Multiplier on mass-to-mass acceleration.
///
/// The force law is tuned for the grid's visual depth, not for motion; this
/// brings mutual attraction up to a watchable pace.
pub const PHYSICS_SPEED: f32 = 50.0;

/// Per-second velocity decay applied to masses.  0.0 disables it.
pub const MASS_FRICTION: f32 = 1.0;

/// Half-width of the square region masses may occupy.
pub const MASS_MAP_LIMIT: f32 = 480.0;

/// Fraction of velocity kept (and reversed) when a mass hits the map edge.
pub const MASS_BOUNCE_DAMPING: f32 = 0.8;

/// Edge fade applied to mass elevation and the grid surface.
pub const MASS_FADE_INNER: f32 = 300.0;
pub const MASS_FADE_OUTER: f32 = 480.0;

// ── Observer ─────────────────────────────────────────────────────────────────

/// Test mass of the first-person observer.
pub const OBSERVER_MASS: f32 = 20.0;

/// Multiplier on the field force felt by the observer.
pub const OBSERVER_GRAVITY_SCALE: f32 = 1.0;

/// Acceleration (u/s²) produced by held movement keys.
pub const OBSERVER_THRUST: f32 = 150.0;

/// Per-second velocity decay applied to the observer.
pub const OBSERVER_FRICTION: f32 = 2.0;

/// Half-width of the square region the observer may walk.
pub const OBSERVER_MAP_LIMIT: f32 = 480.0;

/// Fraction of velocity kept (and reversed) when the observer hits the edge.
pub const OBSERVER_BOUNCE_DAMPING: f32 = 0.5;

/// Edge fade applied to the observer's elevation.
pub const OBSERVER_FADE_INNER: f32 = 300.0;
pub const OBSERVER_FADE_OUTER: f32 = 480.0;

/// Camera height above the observer's field elevation.
pub const EYE_HEIGHT: f32 = 15.0;

/// Observer position on every entry into first-person mode.
pub const OBSERVER_SPAWN: [f32; 3] = [0.0, 0.0, 300.0];

// ── Camera ───────────────────────────────────────────────────────────────────

/// Radians of yaw/pitch per pixel of drag in first-person.
pub const LOOK_SENSITIVITY: f32 = 0.002;

/// Free-orbit overhead vantage the camera flies to.
pub const OVERHEAD_VANTAGE: [f32; 3] = [0.0, 400.0, 600.0];

/// Duration (s) of the fly-to animation.
pub const FLIGHT_DURATION: f32 = 1.5;

/// Radians of orbit rotation per pixel of drag.
pub const ORBIT_SENSITIVITY: f32 = 0.005;

/// Fraction of the current distance zoomed per scroll line.
pub const ORBIT_ZOOM_SPEED: f32 = 0.1;

/// Orbit distance bounds.
pub const ORBIT_MIN_DISTANCE: f32 = 50.0;
pub const ORBIT_MAX_DISTANCE: f32 = 1500.0;

/// Keeps the orbit camera just above the grid plane.
pub const ORBIT_MAX_POLAR: f32 = std::f32::consts::FRAC_PI_2 - 0.05;

/// Keeps the orbit camera off the exact pole (degenerate look-at).
pub const ORBIT_MIN_POLAR: f32 = 0.05;

// ── Rendering ────────────────────────────────────────────────────────────────

/// HUD font size.
pub const HUD_FONT_SIZE: f32 = 16.0;
