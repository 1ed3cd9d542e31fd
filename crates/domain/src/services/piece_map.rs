use crate::entities::{CacheSnapshot, Completion, PieceClass, PieceMapSummary, PieceView};

/// Build the dense piece map for a snapshot.
///
/// Always yields exactly `piece_count` views in index order, whatever subset of
/// pieces the backend reported. Reader tags are laid over the completion state.
pub fn derive_piece_map(snapshot: &CacheSnapshot) -> Vec<PieceView> {
    (0..snapshot.piece_count)
        .map(|index| derive_piece(snapshot, index))
        .collect()
}

fn derive_piece(snapshot: &CacheSnapshot, index: usize) -> PieceView {
    let mut view = PieceView::empty(index);

    if let Some(record) = snapshot.piece(index) {
        view.class.completion = if record.is_complete() {
            Completion::Complete
        } else {
            Completion::Loading
        };
        view.percentage = Some(record.percentage());
    }

    for reader in &snapshot.readers {
        if reader.is_reader_at(index) {
            view.class.reader = true;
        } else if reader.covers(index) {
            view.class.in_reader_range = true;
        }
    }

    view
}

pub fn summarize(map: &[PieceView]) -> PieceMapSummary {
    map.iter().fold(
        PieceMapSummary {
            total: map.len(),
            ..Default::default()
        },
        |mut summary, view| {
            tally(&mut summary, &view.class);
            summary
        },
    )
}

fn tally(summary: &mut PieceMapSummary, class: &PieceClass) {
    match class.completion {
        Completion::Empty => summary.empty += 1,
        Completion::Loading => summary.loading += 1,
        Completion::Complete => summary.complete += 1,
    }
    if class.reader {
        summary.reader_positions += 1;
    }
    if class.in_reader_range {
        summary.in_reader_range += 1;
    }
}
