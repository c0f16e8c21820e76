mod runner;

pub use runner::ScriptRunner;

use eyre::{Result, bail};

use crate::contracts::ContractId;

/// A group of contracts deployed together, selectable by tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployScript {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub contracts: &'static [ContractId],
}

/// Deploy scripts in execution order
pub const SCRIPTS: &[DeployScript] = &[
    DeployScript {
        name: "01-deploy-nft-marketplace",
        tags: &["all", "nftmarketplace"],
        contracts: &[ContractId::NftMarketplace],
    },
    DeployScript {
        name: "02-deploy-basic-nft",
        tags: &["all", "basicNft"],
        contracts: &[ContractId::BasicNft, ContractId::BasicNftTwo],
    },
];

impl DeployScript {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

/// Scripts carrying any of `tags`, or every script when no tags are given
pub fn select<'a>(scripts: &'a [DeployScript], tags: &[String]) -> Result<Vec<&'a DeployScript>> {
    if tags.is_empty() {
        return Ok(scripts.iter().collect());
    }

    for tag in tags {
        if !scripts.iter().any(|s| s.has_tag(tag)) {
            bail!("No deploy script is tagged {:?}", tag);
        }
    }

    Ok(scripts
        .iter()
        .filter(|s| tags.iter().any(|tag| s.has_tag(tag)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(scripts: &[&DeployScript]) -> Vec<&'static str> {
        scripts.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_select_all() {
        let everything = names(&select(SCRIPTS, &[]).unwrap());
        assert_eq!(everything, vec!["01-deploy-nft-marketplace", "02-deploy-basic-nft"]);

        let tagged = names(&select(SCRIPTS, &["all".to_string()]).unwrap());
        assert_eq!(tagged, everything);
    }

    #[test]
    fn test_select_by_group_tag() {
        let selected = select(SCRIPTS, &["basicNft".to_string()]).unwrap();
        assert_eq!(names(&selected), vec!["02-deploy-basic-nft"]);
        assert_eq!(
            selected[0].contracts,
            &[ContractId::BasicNft, ContractId::BasicNftTwo]
        );

        let selected = select(SCRIPTS, &["nftmarketplace".to_string()]).unwrap();
        assert_eq!(names(&selected), vec!["01-deploy-nft-marketplace"]);
    }

    #[test]
    fn test_selection_keeps_declared_order() {
        let tags = ["basicNft".to_string(), "nftmarketplace".to_string()];
        assert_eq!(
            names(&select(SCRIPTS, &tags).unwrap()),
            vec!["01-deploy-nft-marketplace", "02-deploy-basic-nft"]
        );
    }

    #[test]
    fn test_unknown_tag() {
        assert!(select(SCRIPTS, &["basicnft".to_string()]).is_err());
    }
}
