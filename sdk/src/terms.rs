//! Swap terms: who trades which holdings
//!
//! `SwapTerms` is the resolved, in-memory form of a trade. Legs of a side are kept
//! in account order: NFT legs first, then the fungible leg.

use barter_escrow::{
    constants::{MAX_FUNGIBLE_LEGS, MAX_NFT_LEGS, NATIVE_DECIMALS, NFT_AMOUNT},
    AccountRole, EscrowState, Field, LegRecord, NativeLeg, Side, SwapManifest,
};
use solana_sdk::pubkey::Pubkey;

use crate::{
    config::{KeysConfig, LegConfig, LegKind, SideConfig, TermsConfig},
    error::{SdkError, SdkResult},
    keystore::KeyStore,
    utils::parse_amount,
};

/// Holdings touched by one leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldingPair {
    pub initiator: Pubkey,
    pub counterparty: Pubkey,
    /// Escrow-custodied holding, initiator legs only
    pub custody: Option<Pubkey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FungibleLeg {
    pub holdings: HoldingPair,
    pub amount: u64,
}

/// Everything one side gives up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideTerms {
    pub nfts: Vec<HoldingPair>,
    pub fungible: Option<FungibleLeg>,
}

impl SideTerms {
    /// Legs in account order with the amount each moves
    pub fn legs(&self) -> Vec<(HoldingPair, u64)> {
        self.nfts
            .iter()
            .map(|holdings| (*holdings, NFT_AMOUNT))
            .chain(self.fungible.iter().map(|leg| (leg.holdings, leg.amount)))
            .collect()
    }

    pub fn leg_count(&self) -> usize {
        self.nfts.len() + self.fungible.iter().count()
    }
}

/// Fully resolved terms of a swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTerms {
    pub initiator: Pubkey,
    pub counterparty: Pubkey,
    pub escrow: Pubkey,
    pub native: NativeLeg,
    pub initiator_side: SideTerms,
    pub counterparty_side: SideTerms,
}

impl SwapTerms {
    pub fn side(&self, side: Side) -> &SideTerms {
        match side {
            Side::Initiator => &self.initiator_side,
            Side::Counterparty => &self.counterparty_side,
        }
    }

    /// Check leg limits and custody placement
    pub fn check(&self) -> SdkResult<()> {
        for side in Side::ALL {
            let terms = self.side(side);
            if terms.nfts.len() > MAX_NFT_LEGS {
                return Err(SdkError::Configuration(format!(
                    "{side} side has {} NFT legs, at most {MAX_NFT_LEGS} allowed",
                    terms.nfts.len()
                )));
            }
            for (leg, (holdings, _)) in terms.legs().iter().enumerate() {
                match (side, holdings.custody) {
                    (Side::Initiator, None) => {
                        return Err(SdkError::MissingAccountReference {
                            role: AccountRole::Custody { leg },
                            detail: "initiator legs are moved through custody".into(),
                        })
                    }
                    (Side::Counterparty, Some(_)) => {
                        return Err(SdkError::Configuration(format!(
                            "counterparty leg {leg} cannot be custodied"
                        )))
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Wire manifest for these terms
    pub fn manifest(&self) -> SdkResult<SwapManifest> {
        self.check()?;
        let amounts = |side| -> Vec<u64> {
            self.side(side).legs().iter().map(|(_, amount)| *amount).collect()
        };
        Ok(SwapManifest::new(
            self.native,
            amounts(Side::Initiator),
            amounts(Side::Counterparty),
        )?)
    }

    /// The escrow record Initialize writes for these terms
    pub fn expected_record(&self, authority: Pubkey) -> SdkResult<EscrowState> {
        self.check()?;
        let records = |side| -> Vec<LegRecord> {
            self.side(side)
                .legs()
                .into_iter()
                .map(|(holdings, amount)| LegRecord {
                    initiator_holding: holdings.initiator,
                    counterparty_holding: holdings.counterparty,
                    custody: holdings.custody,
                    amount,
                })
                .collect()
        };
        Ok(EscrowState::new(
            self.initiator,
            self.counterparty,
            authority,
            self.native,
            records(Side::Initiator),
            records(Side::Counterparty),
        )?)
    }

    /// Account for a party or leg role; program and sysvar roles are not terms
    pub fn account(&self, role: AccountRole) -> Option<Pubkey> {
        let leg = |side: Side, leg: usize| self.side(side).legs().get(leg).map(|(h, _)| *h);
        match role {
            AccountRole::Initiator => Some(self.initiator),
            AccountRole::Counterparty => Some(self.counterparty),
            AccountRole::EscrowState => Some(self.escrow),
            AccountRole::InitiatorHolding { side, leg: index } => {
                leg(side, index).map(|h| h.initiator)
            }
            AccountRole::CounterpartyHolding { side, leg: index } => {
                leg(side, index).map(|h| h.counterparty)
            }
            AccountRole::Custody { leg: index } => {
                leg(Side::Initiator, index).and_then(|h| h.custody)
            }
            AccountRole::Rent
            | AccountRole::TokenProgram
            | AccountRole::Authority
            | AccountRole::SystemProgram => None,
        }
    }
}

impl TermsConfig {
    /// Resolve key names through `store`. Unknown names surface as
    /// `MissingAccountReference` for the role they were meant to fill.
    pub fn resolve(&self, keys: &KeysConfig, store: &dyn KeyStore) -> SdkResult<SwapTerms> {
        let lookup = |role: AccountRole, name: &str| {
            store
                .load_public(name)
                .map_err(|e| SdkError::MissingAccountReference {
                    role,
                    detail: e.to_string(),
                })
        };

        let native_lamports = parse_amount(
            &self.native.amount,
            NATIVE_DECIMALS,
            Field::NativeAmount,
        )?;

        let terms = SwapTerms {
            initiator: lookup(AccountRole::Initiator, &keys.initiator)?,
            counterparty: lookup(AccountRole::Counterparty, &keys.counterparty)?,
            escrow: lookup(AccountRole::EscrowState, &keys.escrow)?,
            native: NativeLeg::new(self.native.direction.into(), native_lamports),
            initiator_side: resolve_side(Side::Initiator, &self.initiator, &lookup)?,
            counterparty_side: resolve_side(Side::Counterparty, &self.counterparty, &lookup)?,
        };
        terms.check()?;
        Ok(terms)
    }
}

fn resolve_side(
    side: Side,
    config: &SideConfig,
    lookup: &dyn Fn(AccountRole, &str) -> SdkResult<Pubkey>,
) -> SdkResult<SideTerms> {
    // Account order puts NFT legs ahead of the fungible leg
    let mut ordered: Vec<&LegConfig> = config
        .legs
        .iter()
        .filter(|leg| leg.kind == LegKind::Nft)
        .collect();
    ordered.extend(config.legs.iter().filter(|leg| leg.kind == LegKind::Fungible));

    let fungible_legs = ordered
        .iter()
        .filter(|leg| leg.kind == LegKind::Fungible)
        .count();
    if fungible_legs > MAX_FUNGIBLE_LEGS {
        return Err(SdkError::Configuration(format!(
            "{side} side has {fungible_legs} fungible legs, at most {MAX_FUNGIBLE_LEGS} allowed"
        )));
    }

    let mut terms = SideTerms::default();
    for (leg, config) in ordered.into_iter().enumerate() {
        let holdings = HoldingPair {
            initiator: lookup(AccountRole::InitiatorHolding { side, leg }, &config.initiator)?,
            counterparty: lookup(
                AccountRole::CounterpartyHolding { side, leg },
                &config.counterparty,
            )?,
            custody: config
                .custody
                .as_deref()
                .map(|name| lookup(AccountRole::Custody { leg }, name))
                .transpose()?,
        };

        match config.kind {
            LegKind::Nft => terms.nfts.push(holdings),
            LegKind::Fungible => {
                let field = Field::LegAmount(side, leg);
                let amount = config.amount.as_deref().ok_or_else(|| {
                    SdkError::Configuration(format!("{field} is missing"))
                })?;
                let amount = parse_amount(amount, config.decimals.unwrap_or(0), field)?;
                terms.fungible = Some(FungibleLeg { holdings, amount });
            }
        }
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_escrow::NativeDirection;

    fn pair(custody: bool) -> HoldingPair {
        HoldingPair {
            initiator: Pubkey::new_unique(),
            counterparty: Pubkey::new_unique(),
            custody: custody.then(Pubkey::new_unique),
        }
    }

    fn terms() -> SwapTerms {
        SwapTerms {
            initiator: Pubkey::new_unique(),
            counterparty: Pubkey::new_unique(),
            escrow: Pubkey::new_unique(),
            native: NativeLeg::new(NativeDirection::CounterpartyToInitiator, 10),
            initiator_side: SideTerms {
                nfts: vec![pair(true), pair(true)],
                fungible: Some(FungibleLeg {
                    holdings: pair(true),
                    amount: 500,
                }),
            },
            counterparty_side: SideTerms {
                nfts: vec![pair(false)],
                fungible: None,
            },
        }
    }

    #[test]
    fn test_manifest_orders_nfts_before_fungible() {
        let manifest = terms().manifest().unwrap();
        assert_eq!(manifest.legs(Side::Initiator), &[1, 1, 500]);
        assert_eq!(manifest.legs(Side::Counterparty), &[1]);
        assert_eq!(manifest.native().lamports, 10);
    }

    #[test]
    fn test_account_lookup() {
        let terms = terms();
        let fungible = terms.initiator_side.fungible.unwrap().holdings;
        assert_eq!(terms.account(AccountRole::Custody { leg: 2 }), fungible.custody);
        assert_eq!(
            terms.account(AccountRole::CounterpartyHolding {
                side: Side::Initiator,
                leg: 2
            }),
            Some(fungible.counterparty)
        );
        assert_eq!(
            terms.account(AccountRole::InitiatorHolding {
                side: Side::Counterparty,
                leg: 1
            }),
            None
        );
        assert_eq!(terms.account(AccountRole::TokenProgram), None);
    }

    #[test]
    fn test_initiator_leg_without_custody() {
        let mut terms = terms();
        terms.initiator_side.nfts[1].custody = None;
        assert!(matches!(
            terms.manifest(),
            Err(SdkError::MissingAccountReference {
                role: AccountRole::Custody { leg: 1 },
                ..
            })
        ));
    }

    #[test]
    fn test_expected_record_matches_terms() {
        let terms = terms();
        let authority = Pubkey::new_unique();
        let record = terms.expected_record(authority).unwrap();
        assert_eq!(record.authority(), &authority);
        assert_eq!(record.legs(Side::Initiator).len(), 3);
        assert_eq!(record.legs(Side::Counterparty)[0].custody, None);
    }
}
