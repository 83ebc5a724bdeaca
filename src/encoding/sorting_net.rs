//! Batcher odd-even merge sorting networks over literal sequences.
//!
//! A network is a transient scratch structure with one entry per wire
//! holding the output variable of the last comparator that touched the wire
//! (no comparator yet means the wire still carries its input literal). The
//! comparator sequence is oblivious: it only depends on the number of wires.
//!
//! Comparators are oriented so the lower-indexed wire receives the maximum;
//! the wire outputs are therefore non-increasing and position `j` is true
//! iff at least `j + 1` inputs are true.

use crate::basic_types::Lit;
use crate::encoding::EncodingContext;

/// A subsequence of wires described as (first wire, length, stride).
///
/// The odd-even merge recursion works on interleaved subsequences, which is
/// exactly what the stride expresses.
#[derive(Debug, Clone, Copy)]
struct WireSeq {
    first: usize,
    len: usize,
    stride: usize,
}

impl WireSeq {
    fn contiguous(first: usize, len: usize) -> WireSeq {
        WireSeq {
            first,
            len,
            stride: 1,
        }
    }

    fn odd(self) -> WireSeq {
        WireSeq {
            first: self.first,
            len: self.len.div_ceil(2),
            stride: self.stride * 2,
        }
    }

    fn even(self) -> WireSeq {
        WireSeq {
            first: self.first + self.stride,
            len: self.len / 2,
            stride: self.stride * 2,
        }
    }

    /// The wire carrying the `index`-th element (0-based) of the sequence.
    fn wire(self, index: usize) -> usize {
        self.first + self.stride * index
    }
}

#[derive(Debug)]
pub(crate) struct SortingNetwork {
    inputs: Vec<Lit>,
    /// Output variable of the last comparator touching each wire; `None`
    /// means the wire is untouched and still carries its input.
    outputs: Vec<Option<Lit>>,
    comparators: usize,
}

impl SortingNetwork {
    pub(crate) fn new(inputs: Vec<Lit>) -> SortingNetwork {
        let outputs = vec![None; inputs.len()];
        SortingNetwork {
            inputs,
            outputs,
            comparators: 0,
        }
    }

    /// The number of comparators inserted so far.
    pub(crate) fn comparator_count(&self) -> usize {
        self.comparators
    }

    fn wire_output(&self, wire: usize) -> Lit {
        self.outputs[wire].unwrap_or(self.inputs[wire])
    }

    /// Emits the full odd-even merge sort over all wires.
    pub(crate) fn encode(&mut self, ctx: &mut EncodingContext<'_>) {
        let len = self.inputs.len();
        self.sort_range(ctx, 0, len);
    }

    /// Recursively sorts `len` wires starting at `first`: sort both halves,
    /// then merge them.
    fn sort_range(&mut self, ctx: &mut EncodingContext<'_>, first: usize, len: usize) {
        if len <= 1 {
            // a single wire is already sorted
            return;
        }
        let lower_half = len / 2;
        let upper_half = len - lower_half;
        self.sort_range(ctx, first, lower_half);
        self.sort_range(ctx, first + lower_half, upper_half);
        self.merge(
            ctx,
            WireSeq::contiguous(first, lower_half),
            WireSeq::contiguous(first + lower_half, upper_half),
        );
    }

    /// Batcher merge of two sorted wire sequences: merge the odd-indexed and
    /// even-indexed subsequences, then compare-interchange at the
    /// interleaved positions. Two singletons merge with one comparator.
    fn merge(&mut self, ctx: &mut EncodingContext<'_>, seq1: WireSeq, seq2: WireSeq) {
        if seq1.len == 0 || seq2.len == 0 {
            return;
        }
        if seq1.len == 1 && seq2.len == 1 {
            self.insert_comparator(ctx, seq1.first, seq2.first);
            return;
        }
        self.merge(ctx, seq1.odd(), seq2.odd());
        self.merge(ctx, seq1.even(), seq2.even());
        // interchange inside seq1, connecting its last element to the head
        // of seq2 when seq1 has even length
        let mut i = 2;
        while i <= seq1.len {
            if i == seq1.len {
                self.insert_comparator(ctx, seq1.wire(seq1.len - 1), seq2.first);
            } else {
                self.insert_comparator(ctx, seq1.wire(i - 1), seq1.wire(i));
            }
            i += 2;
        }
        // interchange inside seq2; the parity of seq1 decides where to start
        let mut i = if seq1.len % 2 == 0 { 2 } else { 1 };
        while i < seq2.len {
            self.insert_comparator(ctx, seq2.wire(i - 1), seq2.wire(i));
            i += 2;
        }
    }

    /// Allocates the comparator's two output variables and emits the six
    /// defining clauses; the lower-indexed wire takes the max output.
    fn insert_comparator(&mut self, ctx: &mut EncodingContext<'_>, wire1: usize, wire2: usize) {
        debug_assert!(wire1 < wire2, "comparators connect a wire to a later one");
        self.comparators += 1;
        let in1 = self.wire_output(wire1);
        let in2 = self.wire_output(wire2);
        let out_max = Lit::positive(ctx.fresh());
        let out_min = Lit::positive(ctx.fresh());
        encode_max(ctx, out_max, in1, in2);
        encode_min(ctx, out_min, in1, in2);
        self.outputs[wire1] = Some(out_max);
        self.outputs[wire2] = Some(out_min);
    }

    /// Binds the wire outputs to the reserved sorted-vector variables with
    /// two equivalence clauses per position.
    pub(crate) fn bind_to(&self, ctx: &mut EncodingContext<'_>, sorted: &[Lit]) {
        debug_assert_eq!(sorted.len(), self.inputs.len());
        for (wire, &sorted_var) in sorted.iter().enumerate() {
            let output = self.wire_output(wire);
            ctx.add_hard(vec![!sorted_var, output]);
            ctx.add_hard(vec![sorted_var, !output]);
        }
    }
}

/// `out ↔ in1 ∨ in2`.
fn encode_max(ctx: &mut EncodingContext<'_>, out: Lit, in1: Lit, in2: Lit) {
    ctx.add_hard(vec![!out, in1, in2]);
    ctx.add_hard(vec![out, !in1]);
    ctx.add_hard(vec![out, !in2]);
}

/// `out ↔ in1 ∧ in2`.
fn encode_min(ctx: &mut EncodingContext<'_>, out: Lit, in1: Lit, in2: Lit) {
    ctx.add_hard(vec![!out, in1]);
    ctx.add_hard(vec![!out, in2]);
    ctx.add_hard(vec![out, !in1, !in2]);
}

/// Reserves a fresh sorted-vector range for `terms`, builds the network and
/// binds its outputs. Returns the sorted vector (empty for zero terms).
pub(crate) fn encode_sorted(ctx: &mut EncodingContext<'_>, terms: &[Lit]) -> Vec<Lit> {
    let sorted: Vec<Lit> = terms.iter().map(|_| Lit::positive(ctx.fresh())).collect();
    if terms.is_empty() {
        return sorted;
    }
    let mut network = SortingNetwork::new(terms.to_vec());
    network.encode(ctx);
    network.bind_to(ctx, &sorted);
    log::debug!(
        "sorting network over {} terms: {} comparators",
        terms.len(),
        network.comparator_count()
    );
    sorted
}

/// Merges freshly sorted `new_terms` into an existing sorted vector and
/// returns the combined sorted vector of length `old.len() + new_terms.len()`.
///
/// The new terms are sorted by their own network; the old outputs are laid
/// on the lower wires, the new outputs above them, and a single odd-even
/// merge pass combines the two. Used by core-guided refinement.
#[allow(unused, reason = "core-guided refinement entry point; not wired into the default loop")]
pub(crate) fn merge_into(
    ctx: &mut EncodingContext<'_>,
    old: &[Lit],
    new_terms: &[Lit],
) -> Vec<Lit> {
    if new_terms.is_empty() {
        return old.to_vec();
    }
    let mut new_network = SortingNetwork::new(new_terms.to_vec());
    new_network.encode(ctx);
    let new_sorted: Vec<Lit> = (0..new_terms.len())
        .map(|wire| new_network.wire_output(wire))
        .collect();
    if old.is_empty() {
        let sorted: Vec<Lit> = new_sorted.iter().map(|_| Lit::positive(ctx.fresh())).collect();
        new_network.bind_to(ctx, &sorted);
        return sorted;
    }

    let mut inputs = old.to_vec();
    inputs.extend(new_sorted);
    let mut merged = SortingNetwork::new(inputs);
    merged.merge(
        ctx,
        WireSeq::contiguous(0, old.len()),
        WireSeq::contiguous(old.len(), new_terms.len()),
    );
    let sorted: Vec<Lit> = (0..old.len() + new_terms.len())
        .map(|_| Lit::positive(ctx.fresh()))
        .collect();
    merged.bind_to(ctx, &sorted);
    sorted
}
