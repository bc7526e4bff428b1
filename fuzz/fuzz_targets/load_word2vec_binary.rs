use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let _ = sonde::load_word2vec_binary(data);
        });
    }
}
