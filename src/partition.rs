use crate::model::{Chunk, ChunkLimits, PageRecord};

// Greedy single pass. Pages are the atomic unit: a page that alone exceeds a
// limit still becomes its own chunk rather than being split mid-page.
pub fn partition(records: &[PageRecord], limits: &ChunkLimits) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut candidate = Vec::<PageRecord>::new();
    let mut candidate_words = 0usize;

    for record in records {
        let page_words = record.word_count();
        let would_exceed_words = candidate_words + page_words > limits.max_words;
        let would_exceed_pages = candidate.len() + 1 > limits.max_pages;

        if !candidate.is_empty() && (would_exceed_words || would_exceed_pages) {
            close_candidate(&mut chunks, &mut candidate, &mut candidate_words);
        }

        candidate_words += page_words;
        candidate.push(record.clone());
    }

    if !candidate.is_empty() {
        close_candidate(&mut chunks, &mut candidate, &mut candidate_words);
    }

    chunks
}

fn close_candidate(
    chunks: &mut Vec<Chunk>,
    candidate: &mut Vec<PageRecord>,
    candidate_words: &mut usize,
) {
    let pages = std::mem::take(candidate);
    let word_count = std::mem::take(candidate_words);

    // A chunk is never empty; closing an empty candidate is a no-op.
    let (Some(start_page), Some(end_page)) = (
        pages.first().map(|record| record.page_number),
        pages.last().map(|record| record.page_number),
    ) else {
        return;
    };

    chunks.push(Chunk {
        chunk_id: chunks.len() + 1,
        start_page,
        end_page,
        word_count,
        pages,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageSource;

    fn page(page_number: usize, words: usize) -> PageRecord {
        PageRecord {
            page_number,
            text: vec!["كلمة"; words].join(" "),
            source: PageSource::Text,
        }
    }

    fn limits(max_words: usize, max_pages: usize) -> ChunkLimits {
        ChunkLimits {
            max_words,
            max_pages,
        }
    }

    #[test]
    fn three_text_pages_split_on_word_limit() {
        let records = vec![page(1, 100), page(2, 100), page(3, 100)];

        let chunks = partition(&records, &limits(250, 80));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_page, 1);
        assert_eq!(chunks[0].end_page, 2);
        assert_eq!(chunks[0].word_count, 200);
        assert_eq!(chunks[1].start_page, 3);
        assert_eq!(chunks[1].end_page, 3);
        assert_eq!(chunks[1].word_count, 100);
    }

    #[test]
    fn single_oversized_page_still_forms_one_chunk() {
        let records = vec![page(1, 50_000)];

        let chunks = partition(&records, &limits(25_000, 80));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page_count(), 1);
        assert_eq!(chunks[0].word_count, 50_000);
    }

    #[test]
    fn page_limit_of_one_emits_one_chunk_per_page() {
        let records = vec![page(1, 5), page(2, 5), page(3, 5), page(4, 5)];

        let chunks = partition(&records, &limits(25_000, 1));

        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|chunk| chunk.page_count() == 1));
    }

    #[test]
    fn page_exactly_filling_word_limit_stays_in_chunk() {
        let records = vec![page(1, 100), page(2, 150), page(3, 1)];

        let chunks = partition(&records, &limits(250, 80));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].word_count, 250);
        assert_eq!(chunks[1].start_page, 3);
    }

    #[test]
    fn empty_stream_produces_no_chunks() {
        let chunks = partition(&[], &limits(25_000, 80));
        assert!(chunks.is_empty());
    }

    #[test]
    fn closing_an_empty_candidate_emits_no_chunk() {
        let mut chunks = Vec::new();
        let mut candidate = Vec::new();
        let mut candidate_words = 0usize;

        close_candidate(&mut chunks, &mut candidate, &mut candidate_words);

        assert!(chunks.is_empty());
        assert_eq!(candidate_words, 0);
    }

    #[test]
    fn chunks_exactly_cover_the_page_stream() {
        let records = (1..=17)
            .map(|page_number| page(page_number, (page_number * 37) % 120 + 1))
            .collect::<Vec<PageRecord>>();

        let chunks = partition(&records, &limits(300, 4));

        let covered = chunks
            .iter()
            .flat_map(|chunk| chunk.pages.iter().map(|record| record.page_number))
            .collect::<Vec<usize>>();
        assert_eq!(covered, (1..=17).collect::<Vec<usize>>());

        for chunk in &chunks {
            assert_eq!(chunk.end_page - chunk.start_page + 1, chunk.page_count());
            if chunk.page_count() > 1 {
                assert!(chunk.word_count <= 300);
            }
            assert!(chunk.page_count() <= 4);
        }
    }

    #[test]
    fn chunk_ids_are_dense_starting_at_one() {
        let records = (1..=9).map(|page_number| page(page_number, 80)).collect::<Vec<PageRecord>>();

        let chunks = partition(&records, &limits(200, 80));

        let ids = chunks.iter().map(|chunk| chunk.chunk_id).collect::<Vec<usize>>();
        assert_eq!(ids, (1..=chunks.len()).collect::<Vec<usize>>());
    }

    #[test]
    fn partition_is_deterministic_for_identical_input() {
        let records = (1..=12)
            .map(|page_number| page(page_number, (page_number * 53) % 200 + 1))
            .collect::<Vec<PageRecord>>();
        let chunk_limits = limits(400, 5);

        let first = partition(&records, &chunk_limits);
        let second = partition(&records, &chunk_limits);

        assert_eq!(first, second);
    }
}
