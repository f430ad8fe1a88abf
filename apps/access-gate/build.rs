fn main() {
    built::write_built_file().expect("Falha ao gravar informações de build");
}
