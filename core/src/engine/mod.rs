// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] provides functionality required by hardware wallets.
//!
//! This handles [Event] inputs and returns [Output] responses to the caller,
//! which owns the transport to the host and the user interface. A signing
//! session is started with [Event::TxInit], after which the engine emits
//! requests for each transaction item and confirmations for the user until
//! the signed transaction has been fully streamed.

use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use crate::{
    coin::CoinInfo,
    serialize::{Bitcoin, Strategy},
    tx::{PublicKey, SignTx},
};

mod error;
pub use error::{Error, ErrorKind};

mod event;
pub use event::Event;

mod output;
pub use output::{Chunk, Output, Serialized, CHUNK_SIZE};

mod digest;
pub use digest::TxCheck;

mod function;

pub mod matchcheck;

pub mod weight;

mod signer;
pub use signer::Signer;

/// Engine internal state enumeration
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum State {
    /// Idle state, no transaction running
    Init,

    /// Pass 1, awaiting input
    CollectInputs(u32),
    /// Input path outside the wallet layout pending user approval
    ConfirmForeignPath(u32),
    /// Streaming the previous transaction for the current input
    PrevTx(PrevTxState),
    /// Pass 1, awaiting output
    ConfirmOutputs(u32),
    /// Output pending user approval
    ConfirmOutput(u32),
    /// Fee / lock time / total pending user approval
    ConfirmTotal(TotalState),

    /// Pass 2, awaiting input
    SignInputs(u32),
    /// Re-streaming the transaction for a legacy signature
    SignLegacy(LegacyState),
    /// Pass 2, awaiting output
    SerializeOutputs(u32),
    /// Witness stage, awaiting input
    SignSegwitInputs(u32),

    /// Transaction complete
    Complete,
    /// Transaction denied by the user
    Deny,
    /// Transaction failed
    Error,
}

/// Previous transaction streaming states
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum PrevTxState {
    Meta,
    Input(u32),
    Output(u32),
}

impl Default for PrevTxState {
    fn default() -> Self {
        Self::Meta
    }
}

/// Legacy signature re-streaming states
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum LegacyState {
    Input(u32),
    Output(u32),
}

impl Default for LegacyState {
    fn default() -> Self {
        Self::Input(0)
    }
}

/// Transaction level confirmations, in order
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum TotalState {
    FeeOverThreshold,
    LockTime,
    Total,
}

impl Default for TotalState {
    fn default() -> Self {
        Self::Total
    }
}

impl State {
    /// Check whether the engine is awaiting a user decision
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            State::ConfirmForeignPath(_) | State::ConfirmOutput(_) | State::ConfirmTotal(_)
        )
    }

    /// Check whether a signing session is running
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            State::Init | State::Complete | State::Deny | State::Error
        )
    }
}

/// [`Driver`] trait provides platform support for [`Engine`] instances
pub trait Driver {
    type Node: SigningNode;

    /// BIP-0032 derivation for the provided curve
    fn derive(&self, path: &[u32], curve: &str) -> Result<Self::Node, Error>;
}

impl<T: Driver> Driver for &mut T {
    type Node = T::Node;

    fn derive(&self, path: &[u32], curve: &str) -> Result<Self::Node, Error> {
        T::derive(self, path, curve)
    }
}

/// Derived signing key, zeroized by the engine following use
pub trait SigningNode: Zeroize {
    /// Compressed public key
    fn public_key(&self) -> PublicKey;

    /// Sign a 32-byte digest, returning the compact `r || s` signature
    fn sign(&self, digest: &[u8; 32]) -> Result<[u8; 64], Error>;
}

/// [Engine] provides hardware-independent support for bitcoin-family
/// transaction signing, with serialization provided by the [Strategy] `S`
pub struct Engine<DRV: Driver, S: Strategy = Bitcoin> {
    state: State,
    coin: &'static CoinInfo,
    session: Option<Signer<S>>,
    drv: DRV,
}

impl<DRV: Driver, S: Strategy> Engine<DRV, S> {
    /// Create a new transaction engine instance with the provided driver and coin
    pub const fn new(drv: DRV, coin: &'static CoinInfo) -> Self {
        Self {
            state: State::Init,
            coin,
            session: None,
            drv,
        }
    }

    /// Handle incoming transaction events
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!("event: {:02x?}", evt);

        let r = match (self.state, evt) {
            // Empty event, do nothing
            (_, Event::None) => Ok(Output::None),

            // Fetch transaction state / information
            (_, Event::TxGetInfo) => Ok(self.state_output()),

            // Initialise transaction, discarding any previous session
            (_, Event::TxInit { tx }) => self.tx_init(tx),

            // Pass transaction events to the active session
            (state, _) if state.is_active() => self.session_update(evt),

            // Handle unexpected events
            _e => {
                #[cfg(feature = "log")]
                log::error!("Unexpected event in state {:?}: {:02x?}", self.state, _e);

                return Err(Error::UnexpectedEvent);
            }
        };

        match r {
            Ok(output) => Ok(output),
            Err(e) => {
                self.abort(e);
                Err(e)
            }
        }
    }

    /// Fetch current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Fetch coin parameters
    pub fn coin(&self) -> &'static CoinInfo {
        self.coin
    }

    /// Fetch progress for the active signing session
    pub fn progress(&self) -> Option<usize> {
        match (self.state, &self.session) {
            (State::Complete, _) => Some(100),
            (s, Some(session)) if s.is_active() => Some(session.progress()),
            _ => None,
        }
    }

    /// Reset engine state, discarding any session
    pub fn reset(&mut self) {
        self.session = None;
        self.state = State::Init;
    }

    fn state_output(&self) -> Output {
        Output::State {
            state: self.state,
            progress: self.progress(),
        }
    }

    fn tx_init(&mut self, tx: &SignTx) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::info!(
            "tx init, {} inputs {} outputs ({})",
            tx.inputs_count,
            tx.outputs_count,
            self.coin.name
        );

        // Ensure no prior session can be reused
        self.session = None;

        let mut session = Signer::<S>::new(self.coin, tx)?;
        let (state, output) = session.begin()?;

        self.session = Some(session);
        self.state = state;

        Ok(output)
    }

    fn session_update(&mut self, evt: &Event) -> Result<Output, Error> {
        let session = match &mut self.session {
            Some(s) => s,
            None => return Err(Error::InvalidState),
        };

        let (state, output) = session.update(self.state, evt, &self.drv)?;

        #[cfg(feature = "log")]
        log::debug!("state: {} -> {}", self.state, state);

        self.state = state;

        if state == State::Complete {
            self.session = None;
        }

        Ok(output)
    }

    /// Abort the active session following an error
    fn abort(&mut self, e: Error) {
        #[cfg(feature = "log")]
        log::error!("session aborted in state {:?}: {:?} ({:?})", self.state, e, e.kind());

        self.session = None;
        self.state = match e {
            Error::UserDenied => State::Deny,
            _ => State::Error,
        };
    }
}
