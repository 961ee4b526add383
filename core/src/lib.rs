// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Bitcoin-family hardware wallet signing core
//!
//! This provides a common [Engine][engine] supporting transaction verification and signing
//! for execution on hardware wallets, without trusting the host that supplies transaction data.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s and
//! [Output][engine::Output]s, with the caller owning the transport and user interface.
//!
//! ## Signing a transaction
//!
//! Transactions are streamed from the host one input or output at a time, so the
//! device only ever holds a single item plus a small amount of session state.
//! Each request emitted by the engine carries the chunk of the signed transaction
//! serialized since the previous request, and at most one signature.
//!
//! 1. Issue [`TxInit`][engine::Event::TxInit] with the transaction header
//! 2. Answer [`TxInput`][engine::Output::TxInput] requests for each input.
//!    Inputs whose amount is not committed by the signature hash are followed by a
//!    [`TxMeta`][engine::Output::TxMeta] request and the inputs / outputs of the
//!    previous transaction, which is hashed and checked against the input's `prev_hash`.
//!    Inputs spent from paths outside the wallet layout are first shown to the user
//!    with [`ConfirmForeignPath`][engine::Output::ConfirmForeignPath]
//! 3. Answer [`TxOutput`][engine::Output::TxOutput] requests for each output, with
//!    [`ConfirmOutput`][engine::Output::ConfirmOutput] shown to the user for every
//!    output that is not change
//! 4. Show fee / lock time / [`ConfirmTotal`][engine::Output::ConfirmTotal] confirmations
//! 5. Answer the second pass of input and output requests, during which signatures
//!    are produced and the transaction is serialized
//! 6. On [`Finished`][engine::Output::Finished] concatenate all received chunks to
//!    form the signed transaction
//!
//! Any error aborts the whole session, no partial result is ever returned.
//! See `tests/src/host.rs` for a reference host implementation.
//!
//! ## Coins
//!
//! Coin parameters are provided via [CoinInfo][coin::CoinInfo], with serialization and
//! signature hashing supplied by a [Strategy][serialize::Strategy]. [Bitcoin][serialize::Bitcoin]
//! covers bitcoin-like coins (legacy, BIP143 and segwit signing), [Decred][serialize::Decred]
//! covers the split prefix / witness serialization used by Decred.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod coin;

pub mod engine;

pub mod hash;

pub mod helpers;

pub mod multisig;

pub mod scripts;

pub mod serialize;

pub mod tx;

pub mod writers;
