use crate::genomics::GeneticConfig;
use crate::Innovation;

use neurevo::InnovationRecord;
use serde::{Deserialize, Serialize};

use std::collections::btree_map::{BTreeMap, Entry};

/// An `InnovationLog` keeps track of gene and node innovations in a
/// population, in order to make sure identical mutations
/// are assigned the same innovation numbers.
///
/// For gene innovations the input and output nodes are used to
/// identify identical mutations, and the corresponding innovation
/// number is recorded.
///
/// For node innovations the split gene is used to identify
/// identical mutations, and the innovation numbers for the
/// corresponding input gene, new node, and output gene are
/// recorded, in that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationLog {
    next_gene_innovation: Innovation,
    next_node_innovation: Innovation,
    // JSON maps need string keys, so the pair-keyed map is
    // persisted as a sequence of entries.
    #[serde(with = "endpoint_keyed")]
    gene_innovations: BTreeMap<(Innovation, Innovation), Innovation>,
    gene_endpoints: Vec<(Innovation, Innovation)>,
    node_innovations: BTreeMap<Innovation, (Innovation, Innovation, Innovation)>,
}

impl InnovationRecord for InnovationLog {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> InnovationLog {
        Self::new(config)
    }
}

impl InnovationLog {
    /// Creates a new InnovationLog using the specified configuration.
    ///
    /// Initially generated genes are given the innovation number
    /// `o + i ⨯ output_count`, where `i` is the innovation number
    /// of their input node and `o` is the index of their output node.
    /// Thus, the next available gene innovation number returnable by
    /// the log starts at `input_count ⨯ output_count`.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{GeneticConfig, InnovationLog};
    ///
    /// let log = InnovationLog::new(&GeneticConfig::zero());
    /// ```
    pub fn new(config: &GeneticConfig) -> InnovationLog {
        let (gene_innovations, gene_endpoints) = (0..config.input_count.get())
            // Cartesian product of inputs and outputs...
            .flat_map(|i| (0..config.output_count.get()).map(move |o| (i, o)))
            // Get the output innovation number, as we only have indices...
            .map(|(i, o)| (i, o, o + config.input_count.get()))
            // Get both gene innovations and gene endpoints...
            .map(|(i, o_idx, o)| (((i, o), o_idx + i * config.output_count.get()), (i, o)))
            .unzip();
        InnovationLog {
            // Pre-allocate innovation numbers for all possible initial
            // genes, and the input and output nodes.
            next_gene_innovation: config.input_count.get() * config.output_count.get(),
            next_node_innovation: config.input_count.get() + config.output_count.get(),
            gene_innovations,
            gene_endpoints,
            node_innovations: BTreeMap::new(),
        }
    }

    /// Returns the next gene innovation number, or the
    /// previously assigned number for the same gene mutation.
    pub(crate) fn next_gene_innovation(
        &self,
        input_id: Innovation,
        output_id: Innovation,
    ) -> Innovation {
        *self
            .gene_innovations
            .get(&(input_id, output_id))
            .unwrap_or(&self.next_gene_innovation)
    }

    /// Returns the next node and gene innovation numbers,
    /// or the previously assigned numbers for the same node mutation,
    /// in the format `(input gene, new node, output gene)`.
    ///
    /// If `duplicate` is `true` and the node mutation is
    /// already registered, the returned innovation numbers
    /// will be computed as if it were a new mutation. This
    /// is used in situations in which the mutating genome
    /// already split the same gene in a previous mutation,
    /// which would result in duplicate genes and nodes within
    /// the same genome.
    pub(crate) fn next_node_innovation(
        &self,
        split_gene: Innovation,
        duplicate: bool,
    ) -> (Innovation, Innovation, Innovation) {
        if !self.node_innovations.contains_key(&split_gene) || duplicate {
            (
                self.next_gene_innovation,
                self.next_node_innovation,
                self.next_gene_innovation + 1,
            )
        } else {
            self.node_innovations[&split_gene]
        }
    }

    /// Adds a gene mutation to the log, assigning it the next
    /// gene innovation number if the mutation is new.
    pub(crate) fn add_gene_innovation(&mut self, input_id: Innovation, output_id: Innovation) {
        if let Entry::Vacant(entry) = self.gene_innovations.entry((input_id, output_id)) {
            entry.insert(self.next_gene_innovation);
            self.gene_endpoints.push((input_id, output_id));
            self.next_gene_innovation += 1;
        }
    }

    /// Adds a node mutation to the log, if the mutation is new.
    ///
    /// If `duplicate` is `true` and the node mutation is
    /// already registered, new innovation numbers are assigned
    /// as if it were a new mutation, and substitute the
    /// previously assigned ones.
    pub(crate) fn add_node_innovation(&mut self, split_gene: Innovation, duplicate: bool) {
        if !self.node_innovations.contains_key(&split_gene) || duplicate {
            let (split_gene_input_node, split_gene_output_node) = self.gene_endpoints[split_gene];
            let new_node = self.next_node_innovation;

            let new_input_gene = self.next_gene_innovation;
            self.add_gene_innovation(split_gene_input_node, new_node);
            let new_output_gene = self.next_gene_innovation;
            self.add_gene_innovation(new_node, split_gene_output_node);
            let innovation_record = (new_input_gene, new_node, new_output_gene);

            self.node_innovations.insert(split_gene, innovation_record);
            self.next_node_innovation += 1;
        }
    }

    /// Returns the highest gene innovation number generated.
    pub fn max_gene_innovation(&self) -> Innovation {
        self.next_gene_innovation - 1
    }

    /// Returns the highest node innovation number generated.
    pub fn max_node_innovation(&self) -> Innovation {
        self.next_node_innovation - 1
    }

    /// Returns an iterator over the complete record of
    /// gene innovations, in the format
    /// `((input node, output node), gene innovation)`,
    /// in endpoint order.
    pub fn gene_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.gene_innovations.iter()
    }

    /// Returns an iterator over the complete record of
    /// node innovations, in the format
    /// `(split gene, (input gene, new node, output gene))`,
    /// in split-gene order.
    pub fn node_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&Innovation, &(Innovation, Innovation, Innovation))> {
        self.node_innovations.iter()
    }
}

mod endpoint_keyed {
    use crate::Innovation;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use std::collections::BTreeMap;

    type Map = BTreeMap<(Innovation, Innovation), Innovation>;

    pub(super) fn serialize<S: Serializer>(map: &Map, serializer: S) -> Result<S::Ok, S::Error> {
        map.iter().collect::<Vec<_>>().serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map, D::Error> {
        let entries = Vec::<((Innovation, Innovation), Innovation)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
