use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            if let Ok(index) = sonde::load_text(data) {
                if let Some(word) = index.words().next().map(str::to_string) {
                    let _ = index.neighbors_of_word(&word, 5);
                }
            }
        });
    }
}
