//! Error types for lathe-motion.
//!
//! Provides unified error handling across configuration, axis control and
//! operation sequencing. All conditions are reported as values; no error ever
//! crosses a component boundary as control flow.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all lathe-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Axis motion error
    Axis(AxisError),
    /// Operation / mode sequencing error
    Operation(OperationError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// File I/O error
    IoError(heapless::String<128>),
    /// Motor steps per revolution must be > 0
    InvalidMotorSteps(f32),
    /// Lead screw pitch must be non-zero
    InvalidScrewPitch(f32),
    /// Speed values must be > 0 and start speed must not exceed the manual ceiling
    InvalidSpeed {
        /// Start speed in steps/sec
        start: f32,
        /// Manual-move ceiling in steps/sec
        manual: f32,
    },
    /// Acceleration must be > 0
    InvalidAcceleration(f32),
    /// Maximum travel must be > 0
    InvalidMaxTravel(i64),
    /// Backlash must be >= 0
    InvalidBacklash(i64),
    /// Encoder steps per revolution must be > 0
    InvalidEncoderSteps(i64),
    /// Counter clear threshold must exceed one revolution of margin
    InvalidCounterThreshold(i32),
    /// Requested pitch outside the configured bound
    PitchOutOfRange {
        /// Requested pitch in deci-microns per revolution
        pitch: i64,
        /// Configured maximum magnitude
        max: i64,
    },
    /// Requested thread starts outside the configured bound
    StartsOutOfRange {
        /// Requested number of starts
        starts: u16,
        /// Configured maximum
        max: u16,
    },
    /// Requested pass count outside the configured bound
    PassesOutOfRange {
        /// Requested number of passes
        passes: u16,
        /// Configured maximum
        max: u16,
    },
    /// The auxiliary axis mode was selected but no auxiliary axis is configured
    AuxAxisMissing,
}

/// Axis motion errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisError {
    /// Exclusive access to the axis could not be acquired within the timeout;
    /// the command was skipped and the axis state is unchanged
    Busy,
    /// Commanded travel exceeds the mechanical ceiling; refused, not clamped
    TravelLimitExceeded {
        /// Commanded travel in steps
        travel: i64,
        /// Mechanical ceiling in steps
        max: i64,
    },
    /// Soft limits must satisfy left >= right
    StopsOutOfOrder {
        /// Left (upper) stop in steps
        left: i64,
        /// Right (lower) stop in steps
        right: i64,
    },
    /// Driver pin operation failed
    Pin,
}

/// Operation / mode sequencing errors.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationError {
    /// A pass mode was enabled without both soft limits set on a driven axis
    MissingLimits {
        /// Name of the axis missing a stop
        axis: heapless::String<8>,
    },
    /// The command requires the system to be enabled
    NotEnabled,
    /// The command is not valid in the current operation mode
    WrongMode,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Axis(e) => write!(f, "Axis error: {}", e),
            Error::Operation(e) => write!(f, "Operation error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::InvalidMotorSteps(v) => {
                write!(f, "Invalid motor steps: {}. Must be > 0", v)
            }
            ConfigError::InvalidScrewPitch(v) => {
                write!(f, "Invalid screw pitch: {} du. Must be non-zero", v)
            }
            ConfigError::InvalidSpeed { start, manual } => {
                write!(
                    f,
                    "Invalid speeds: start {} and manual {} steps/sec. Both must be > 0 and start <= manual",
                    start, manual
                )
            }
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxTravel(v) => {
                write!(f, "Invalid max travel: {} mm. Must be > 0", v)
            }
            ConfigError::InvalidBacklash(v) => {
                write!(f, "Invalid backlash: {} du. Must be >= 0", v)
            }
            ConfigError::InvalidEncoderSteps(v) => {
                write!(f, "Invalid encoder steps per revolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidCounterThreshold(v) => {
                write!(f, "Invalid counter clear threshold: {}", v)
            }
            ConfigError::PitchOutOfRange { pitch, max } => {
                write!(f, "Pitch {} du out of range (max magnitude {})", pitch, max)
            }
            ConfigError::StartsOutOfRange { starts, max } => {
                write!(f, "Starts {} out of range (1..={})", starts, max)
            }
            ConfigError::PassesOutOfRange { passes, max } => {
                write!(f, "Passes {} out of range (1..={})", passes, max)
            }
            ConfigError::AuxAxisMissing => {
                write!(f, "No auxiliary axis configured")
            }
        }
    }
}

impl fmt::Display for AxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisError::Busy => write!(f, "Axis busy: exclusive access timed out"),
            AxisError::TravelLimitExceeded { travel, max } => {
                write!(f, "Travel of {} steps exceeds ceiling of {}", travel, max)
            }
            AxisError::StopsOutOfOrder { left, right } => {
                write!(f, "Stops out of order: left {} < right {}", left, right)
            }
            AxisError::Pin => write!(f, "Driver pin operation failed"),
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::MissingLimits { axis } => {
                write!(f, "Axis {} is missing a soft limit", axis)
            }
            OperationError::NotEnabled => write!(f, "System is not enabled"),
            OperationError::WrongMode => write!(f, "Command not valid in the current mode"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<AxisError> for Error {
    fn from(e: AxisError) -> Self {
        Error::Axis(e)
    }
}

impl From<OperationError> for Error {
    fn from(e: OperationError) -> Self {
        Error::Operation(e)
    }
}

impl std::error::Error for Error {}

impl std::error::Error for ConfigError {}

impl std::error::Error for AxisError {}

impl std::error::Error for OperationError {}
